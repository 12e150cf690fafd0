//! Metrics definitions.
//!
//! Prometheus naming conventions: `ra_` prefix, `_total` suffix for
//! counters. Labels are bounded: `kind` has 2 values (new, replace),
//! `outcome` has 2 values (delivered, dropped), `status` has 2 values
//! (success, error).

use metrics::{counter, gauge};

/// Update the registered-channel gauge.
///
/// Metric: `ra_hub_connections_active`
pub fn set_connections_active(count: usize) {
    gauge!("ra_hub_connections_active").set(count as f64);
}

/// Record a channel registration.
///
/// Metric: `ra_hub_registrations_total`, label `kind` = new | replace
pub fn record_registration(kind: &'static str) {
    counter!("ra_hub_registrations_total", "kind" => kind).increment(1);
}

/// Record the outcome of an answer delivery.
///
/// Metric: `ra_hub_answers_total`, label `outcome` = delivered | dropped
pub fn record_answer(outcome: &'static str) {
    counter!("ra_hub_answers_total", "outcome" => outcome).increment(1);
}

/// Record a token issuance.
///
/// Metric: `ra_tokens_issued_total`, label `lifetime` = short | long
pub fn record_token_issued(lifetime: &'static str) {
    counter!("ra_tokens_issued_total", "lifetime" => lifetime).increment(1);
}

/// Record a token validation outcome.
///
/// Metric: `ra_token_validations_total`, label `status` = success | error
pub fn record_token_validation(status: &'static str) {
    counter!("ra_token_validations_total", "status" => status).increment(1);
}
