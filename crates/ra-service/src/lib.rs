//! Remote Authentication (RA) Service Library
//!
//! Out-of-band authentication handshake: a client opens a persistent
//! WebSocket and waits; a secondary flow answers whether its authentication
//! succeeded, and the result is pushed to the waiting connection. Signed
//! short-lived tokens gate who may open or resume a channel.
//!
//! # Modules
//!
//! - `actors` - hub registry actor and per-connection channel sessions
//! - `clients` - external collaborators (user directory, push service)
//! - `config` - service configuration
//! - `errors` - error types
//! - `handlers` - HTTP request handlers (handshake coordinator)
//! - `models` - wire-format types
//! - `observability` - metrics
//! - `routes` - router assembly
//! - `services` - token issuance/validation

pub mod actors;
pub mod clients;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
