//! HTTP request handlers.

pub mod handshake_handler;
