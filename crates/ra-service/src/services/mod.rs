//! Business logic with no transport concerns.

pub mod token_service;
