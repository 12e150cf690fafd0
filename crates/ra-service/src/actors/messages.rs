//! Message types for the hub actor mailbox.

use super::channel::ChannelHandle;
use crate::models::AnswerPacket;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Operations on the identity→channel registry. Every variant carries a
/// oneshot so callers observe completion; this is what linearizes mutations
/// on the same identity slot.
pub enum HubMessage {
    /// Register a channel under its identity, replacing any prior entry.
    Register {
        channel: ChannelHandle,
        respond_to: oneshot::Sender<()>,
    },

    /// Remove the entry for `identity` if it still belongs to
    /// `connection_id`. Idempotent.
    Unregister {
        identity: String,
        connection_id: Uuid,
        respond_to: oneshot::Sender<()>,
    },

    /// Enqueue `packet` on the live channel for `identity`, if any.
    /// Responds with whether the packet was handed to a channel.
    Deliver {
        identity: String,
        packet: AnswerPacket,
        respond_to: oneshot::Sender<bool>,
    },

    /// Snapshot of the registry, for tests and observability.
    Status {
        respond_to: oneshot::Sender<HubStatus>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStatus {
    /// Number of registered channels.
    pub connections: usize,
}
