//! Per-connection channel: one registered WebSocket bound to an identity.
//!
//! A session runs two independent loops that share nothing but the
//! channel's owned outbound queue and the unregister path back to the hub:
//!
//! - the **send loop** (spawned task) drains the queue and writes each
//!   answer packet as one JSON text frame; it is the sole closer of the
//!   sink, so the connection resource is closed exactly once;
//! - the **receive loop** (session task) reads inbound frames purely to
//!   detect disconnect, and on any read error or stream end requests the
//!   unregistration of its own channel.
//!
//! Neither loop reconnects; a closed connection is terminal and the client
//! re-initiates the handshake from the token step.

use super::hub::HubHandle;
use crate::models::AnswerPacket;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

/// Outbound queue depth. The protocol delivers a single answer packet per
/// handshake, so anything beyond a few slots means the client stopped
/// draining.
const OUTBOUND_BUFFER: usize = 16;

/// Why an enqueue attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliverError {
    /// The session's receiver is gone; the channel entry is dead.
    Closed,
    /// The outbound queue is full.
    QueueFull,
}

/// Registry-side handle to a channel: the identity it is bound to, its
/// outbound queue and the token that force-closes it.
#[derive(Clone, Debug)]
pub struct ChannelHandle {
    identity: String,
    connection_id: Uuid,
    outbound: mpsc::Sender<AnswerPacket>,
    cancel_token: CancellationToken,
}

impl ChannelHandle {
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    #[must_use]
    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Enqueue a packet without blocking the hub.
    pub fn try_deliver(&self, packet: AnswerPacket) -> Result<(), DeliverError> {
        self.outbound.try_send(packet).map_err(|e| match e {
            mpsc::error::TrySendError::Closed(_) => DeliverError::Closed,
            mpsc::error::TrySendError::Full(_) => DeliverError::QueueFull,
        })
    }

    /// Force-close the session. Idempotent.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[cfg(test)]
    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Build a detached handle plus its queue receiver, for registry tests
    /// that do not need a real socket.
    #[cfg(test)]
    pub(crate) fn new_for_test(identity: &str) -> (Self, mpsc::Receiver<AnswerPacket>) {
        let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        (
            Self {
                identity: identity.to_string(),
                connection_id: Uuid::new_v4(),
                outbound,
                cancel_token: CancellationToken::new(),
            },
            outbound_rx,
        )
    }
}

/// Run the channel session for an upgraded socket.
///
/// Registers with the hub, then runs the send/receive loops until the
/// client disconnects, a write fails, or the hub cancels the channel
/// (replacement or shutdown).
#[instrument(skip_all, name = "ra.channel", fields(identity = %identity))]
pub async fn run_session(socket: WebSocket, identity: String, hub: HubHandle) {
    let connection_id = Uuid::new_v4();
    let cancel_token = CancellationToken::new();
    let (outbound, mut outbound_rx) = mpsc::channel::<AnswerPacket>(OUTBOUND_BUFFER);
    let (mut ws_tx, mut ws_rx) = socket.split();

    let handle = ChannelHandle {
        identity: identity.clone(),
        connection_id,
        outbound,
        cancel_token: cancel_token.clone(),
    };

    if let Err(e) = hub.register(handle).await {
        warn!(target: "ra.channel", error = %e, "registration failed, dropping connection");
        let _ = ws_tx.close().await;
        return;
    }

    debug!(
        target: "ra.channel",
        connection_id = %connection_id,
        "channel session started"
    );

    // Send loop. Sole closer of the sink.
    let send_cancel = cancel_token.clone();
    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                () = send_cancel.cancelled() => break,

                packet = outbound_rx.recv() => {
                    let Some(packet) = packet else { break };

                    let frame = match serde_json::to_string(&packet) {
                        Ok(frame) => frame,
                        Err(e) => {
                            error!(target: "ra.channel", error = %e, "packet serialization failed");
                            continue;
                        }
                    };

                    if let Err(e) = ws_tx.send(Message::Text(frame)).await {
                        debug!(target: "ra.channel", error = %e, "write failed, closing");
                        break;
                    }

                    debug!(target: "ra.channel", "answer packet written");
                }
            }
        }

        let _ = ws_tx.close().await;
    });

    // Receive loop. Inbound frames carry no application data after the
    // handshake; reading exists to detect disconnect.
    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                debug!(target: "ra.channel", connection_id = %connection_id, "session cancelled");
                break;
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(target: "ra.channel", connection_id = %connection_id, "client disconnected");
                        break;
                    }
                    Some(Ok(frame)) => {
                        trace!(target: "ra.channel", frame = ?frame, "inbound frame ignored");
                    }
                    Some(Err(e)) => {
                        debug!(target: "ra.channel", error = %e, "read error, closing");
                        break;
                    }
                }
            }
        }
    }

    // Sole disconnect-propagation path: ask the hub to drop this channel.
    // Guarded by connection id, so a superseded channel cannot evict its
    // replacement.
    if let Err(e) = hub.unregister(&identity, connection_id).await {
        warn!(target: "ra.channel", error = %e, "unregister failed");
    }
    cancel_token.cancel();
    let _ = send_task.await;

    info!(
        target: "ra.channel",
        connection_id = %connection_id,
        "channel session ended"
    );
}
