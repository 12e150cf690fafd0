//! Client for the user-directory service.
//!
//! The directory is the authority on which identities exist; it is probed
//! before issuing a connect token and before accepting a registration. Any
//! transport or protocol failure is surfaced as `Unreachable` - the caller
//! maps it to a 503, never retries here.

use crate::models::RegistrationRequest;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("directory service unreachable: {0}")]
    Unreachable(String),
}

/// One user record as returned by `GET /user/email/{email}`.
#[derive(Debug, Deserialize)]
struct UserRecord {
    #[serde(default)]
    #[allow(dead_code)]
    id: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    email: Option<String>,
}

#[derive(Clone)]
pub struct DirectoryClient {
    base_url: String,
    http: reqwest::Client,
}

impl DirectoryClient {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Whether `email` names exactly one known user.
    pub async fn exists(&self, email: &str) -> Result<bool, ClientError> {
        let url = format!("{}/user/email/{}", self.base_url, email);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Unreachable(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::Unreachable(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let users: Vec<UserRecord> = response
            .json()
            .await
            .map_err(|e| ClientError::Unreachable(e.to_string()))?;

        debug!(target: "ra.directory", matches = users.len(), "existence lookup completed");
        Ok(users.len() == 1)
    }

    /// Forward a registration to the directory. Returns whether the
    /// directory accepted it.
    pub async fn create_user(&self, request: &RegistrationRequest) -> Result<bool, ClientError> {
        let url = format!("{}/user", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Unreachable(e.to_string()))?;

        Ok(response.status() == StatusCode::OK)
    }
}
