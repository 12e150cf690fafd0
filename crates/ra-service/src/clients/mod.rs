//! Clients for the external collaborators: the user directory and the
//! push-notification service. Both are plain request/response glue; the
//! core never retries and never holds hub state across a call.

pub mod directory;
pub mod push;
