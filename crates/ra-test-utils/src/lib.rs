//! Test utilities for the remote authentication service.
//!
//! The main entry point is [`TestServer`], which runs the real router on an
//! ephemeral port with a mocked user directory.

pub mod server_harness;

pub use server_harness::TestServer;
