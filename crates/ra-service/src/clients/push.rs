//! Client for the push-notification service.
//!
//! Strictly fire-and-forget: a failed notification is logged and never
//! surfaced to the requesting client. Disabled entirely when no API key is
//! configured.

use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct NotificationRequest<'a> {
    data: NotificationData<'a>,
    to: &'a str,
}

#[derive(Debug, Serialize)]
struct NotificationData<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Clone)]
pub struct PushClient {
    endpoint: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl PushClient {
    #[must_use]
    pub fn new(endpoint: &str, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_key,
            http: reqwest::Client::new(),
        }
    }

    /// Send a notification to `destination`. Never fails the caller.
    pub async fn notify(&self, destination: &str, title: &str, body: &str) {
        let Some(api_key) = &self.api_key else {
            debug!(target: "ra.push", "push disabled, no API key configured");
            return;
        };

        let request = NotificationRequest {
            data: NotificationData { title, body },
            to: destination,
        };

        let result = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("key={api_key}"))
            .json(&request)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(target: "ra.push", "notification sent");
            }
            Ok(response) => {
                warn!(target: "ra.push", status = %response.status(), "notification rejected");
            }
            Err(e) => {
                warn!(target: "ra.push", error = %e, "notification failed");
            }
        }
    }
}
