//! Hub actor - single ownership authority over the identity→channel map.
//!
//! The hub is one task owning a `HashMap`; every register, unregister and
//! delivery goes through its mailbox, so no two mutations on the same
//! identity slot ever interleave. The raw map is never exposed.
//!
//! # Replacement policy
//!
//! Registering under an identity that already holds a channel is a
//! `register-replacing-existing` transition: the superseded channel is
//! forcibly closed (its cancellation token is cancelled) rather than left
//! to die naturally. The per-channel connection id keeps a superseded
//! channel's late unregister from evicting its replacement.

use super::channel::ChannelHandle;
use super::messages::{HubMessage, HubStatus};
use crate::models::AnswerPacket;
use crate::observability::metrics as hub_metrics;

use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Mailbox buffer for the hub. Register/unregister/deliver are all small
/// and the actor never blocks, so a modest buffer suffices.
const HUB_CHANNEL_BUFFER: usize = 256;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("hub unavailable: {0}")]
    Internal(String),
}

/// Cloneable handle to the hub actor.
#[derive(Clone)]
pub struct HubHandle {
    sender: mpsc::Sender<HubMessage>,
    cancel_token: CancellationToken,
}

impl HubHandle {
    /// Spawn the hub actor and return a handle to it.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(HUB_CHANNEL_BUFFER);
        let cancel_token = CancellationToken::new();

        let actor = Hub {
            receiver,
            cancel_token: cancel_token.clone(),
            channels: HashMap::new(),
        };
        tokio::spawn(actor.run());

        Self {
            sender,
            cancel_token,
        }
    }

    /// Register a channel, replacing any prior entry for its identity.
    pub async fn register(&self, channel: ChannelHandle) -> Result<(), HubError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HubMessage::Register {
                channel,
                respond_to: tx,
            })
            .await
            .map_err(|e| HubError::Internal(format!("mailbox send failed: {e}")))?;

        rx.await
            .map_err(|e| HubError::Internal(format!("response receive failed: {e}")))
    }

    /// Unregister the channel for `identity`, guarded by its connection id.
    /// A no-op when the identity is absent or owned by a newer channel.
    pub async fn unregister(&self, identity: &str, connection_id: Uuid) -> Result<(), HubError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HubMessage::Unregister {
                identity: identity.to_string(),
                connection_id,
                respond_to: tx,
            })
            .await
            .map_err(|e| HubError::Internal(format!("mailbox send failed: {e}")))?;

        rx.await
            .map_err(|e| HubError::Internal(format!("response receive failed: {e}")))
    }

    /// Deliver an answer packet to the live channel for `identity`.
    ///
    /// Returns false when no channel is registered - the expected case when
    /// no client is currently waiting, not an error.
    pub async fn deliver(&self, identity: &str, packet: AnswerPacket) -> Result<bool, HubError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HubMessage::Deliver {
                identity: identity.to_string(),
                packet,
                respond_to: tx,
            })
            .await
            .map_err(|e| HubError::Internal(format!("mailbox send failed: {e}")))?;

        rx.await
            .map_err(|e| HubError::Internal(format!("response receive failed: {e}")))
    }

    /// Current registry status.
    pub async fn status(&self) -> Result<HubStatus, HubError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HubMessage::Status { respond_to: tx })
            .await
            .map_err(|e| HubError::Internal(format!("mailbox send failed: {e}")))?;

        rx.await
            .map_err(|e| HubError::Internal(format!("response receive failed: {e}")))
    }

    /// Shut the hub down, closing every registered channel.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl Default for HubHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// The hub actor state. Owned by exactly one task.
struct Hub {
    receiver: mpsc::Receiver<HubMessage>,
    cancel_token: CancellationToken,
    channels: HashMap<String, ChannelHandle>,
}

impl Hub {
    async fn run(mut self) {
        info!(target: "ra.hub", "hub started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(target: "ra.hub", "hub received cancellation signal");
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => self.handle_message(message),
                        None => {
                            info!(target: "ra.hub", "hub mailbox closed, exiting");
                            break;
                        }
                    }
                }
            }
        }

        // Close every remaining channel exactly once on the way out.
        for (identity, channel) in self.channels.drain() {
            debug!(target: "ra.hub", %identity, "closing channel on shutdown");
            channel.cancel();
        }
        hub_metrics::set_connections_active(0);

        info!(target: "ra.hub", "hub stopped");
    }

    fn handle_message(&mut self, message: HubMessage) {
        match message {
            HubMessage::Register {
                channel,
                respond_to,
            } => {
                self.handle_register(channel);
                let _ = respond_to.send(());
            }

            HubMessage::Unregister {
                identity,
                connection_id,
                respond_to,
            } => {
                self.handle_unregister(&identity, connection_id);
                let _ = respond_to.send(());
            }

            HubMessage::Deliver {
                identity,
                packet,
                respond_to,
            } => {
                let delivered = self.handle_deliver(&identity, packet);
                let _ = respond_to.send(delivered);
            }

            HubMessage::Status { respond_to } => {
                let _ = respond_to.send(HubStatus {
                    connections: self.channels.len(),
                });
            }
        }
    }

    fn handle_register(&mut self, channel: ChannelHandle) {
        let identity = channel.identity().to_string();

        if let Some(superseded) = self.channels.insert(identity.clone(), channel) {
            // Tagged transition: a second session under the same identity
            // displaces the first, which is forcibly closed.
            warn!(
                target: "ra.hub",
                identity = %identity,
                superseded_connection = %superseded.connection_id(),
                "register-replacing-existing"
            );
            superseded.cancel();
            hub_metrics::record_registration("replace");
        } else {
            hub_metrics::record_registration("new");
        }

        info!(target: "ra.hub", identity = %identity, "connection added");
        hub_metrics::set_connections_active(self.channels.len());
    }

    fn handle_unregister(&mut self, identity: &str, connection_id: Uuid) {
        match self.channels.get(identity) {
            Some(current) if current.connection_id() == connection_id => {
                if let Some(channel) = self.channels.remove(identity) {
                    channel.cancel();
                    info!(target: "ra.hub", identity = %identity, "connection removed");
                }
                hub_metrics::set_connections_active(self.channels.len());
            }
            Some(_) => {
                // Stale request from a superseded channel; the slot now
                // belongs to its replacement.
                debug!(
                    target: "ra.hub",
                    identity = %identity,
                    connection_id = %connection_id,
                    "ignoring unregister from superseded connection"
                );
            }
            None => {
                debug!(target: "ra.hub", identity = %identity, "unregister for absent identity");
            }
        }
    }

    fn handle_deliver(&mut self, identity: &str, packet: AnswerPacket) -> bool {
        let Some(channel) = self.channels.get(identity) else {
            debug!(target: "ra.hub", identity = %identity, "no channel waiting, answer dropped");
            hub_metrics::record_answer("dropped");
            return false;
        };

        match channel.try_deliver(packet) {
            Ok(()) => {
                debug!(target: "ra.hub", identity = %identity, "answer enqueued");
                hub_metrics::record_answer("delivered");
                true
            }
            Err(super::channel::DeliverError::Closed) => {
                // The session ended but its unregister has not been
                // processed yet; drop the dead entry now.
                if let Some(channel) = self.channels.remove(identity) {
                    channel.cancel();
                }
                hub_metrics::set_connections_active(self.channels.len());
                hub_metrics::record_answer("dropped");
                false
            }
            Err(super::channel::DeliverError::QueueFull) => {
                warn!(target: "ra.hub", identity = %identity, "outbound queue full, answer dropped");
                hub_metrics::record_answer("dropped");
                false
            }
        }
    }
}
