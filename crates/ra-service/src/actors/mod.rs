//! Actor layer: the hub registry task and per-connection channel sessions.
//!
//! All shared mutable state in the service lives behind the hub's mailbox;
//! channel sessions own nothing but their outbound queue.

pub mod channel;
pub mod hub;
pub mod messages;
