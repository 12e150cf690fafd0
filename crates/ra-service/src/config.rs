use base64::{engine::general_purpose, Engine as _};
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default lifetime for the token minted at tryConnect time.
const DEFAULT_SHORT_TOKEN_MINUTES: i64 = 5;

/// Default lifetime for the session token minted on an affirmative answer.
const DEFAULT_LONG_TOKEN_MINUTES: i64 = 131_400;

/// FCM legacy send endpoint, used unless PUSH_SERVICE_URL overrides it.
const DEFAULT_PUSH_SERVICE_URL: &str = "https://fcm.googleapis.com/fcm/send";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub signing_secret: Vec<u8>,
    pub short_token_minutes: i64,
    pub long_token_minutes: i64,
    pub directory_service_url: String,
    pub push_service_url: String,
    pub push_service_key: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid signing secret: {0}")]
    InvalidSigningSecret(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("RA_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:3030".to_string());

        let signing_secret_base64 = vars
            .get("RA_SIGNING_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("RA_SIGNING_SECRET".to_string()))?;

        let signing_secret = general_purpose::STANDARD
            .decode(signing_secret_base64)
            .map_err(ConfigError::Base64Error)?;

        if signing_secret.len() < 32 {
            return Err(ConfigError::InvalidSigningSecret(format!(
                "Expected at least 32 bytes, got {}",
                signing_secret.len()
            )));
        }

        let short_token_minutes =
            parse_minutes(vars, "RA_SHORT_TOKEN_MINUTES", DEFAULT_SHORT_TOKEN_MINUTES)?;
        let long_token_minutes =
            parse_minutes(vars, "RA_LONG_TOKEN_MINUTES", DEFAULT_LONG_TOKEN_MINUTES)?;

        let directory_service_url = vars
            .get("DIRECTORY_SERVICE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DIRECTORY_SERVICE_URL".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let push_service_url = vars
            .get("PUSH_SERVICE_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_PUSH_SERVICE_URL.to_string());

        let push_service_key = vars.get("PUSH_SERVICE_KEY").cloned();

        Ok(Config {
            bind_address,
            signing_secret,
            short_token_minutes,
            long_token_minutes,
            directory_service_url,
            push_service_url,
            push_service_key,
        })
    }
}

fn parse_minutes(
    vars: &HashMap<String, String>,
    name: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    let Some(raw) = vars.get(name) else {
        return Ok(default);
    };

    let minutes: i64 = raw
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string(), raw.clone()))?;

    if minutes <= 0 {
        return Err(ConfigError::InvalidValue(name.to_string(), raw.clone()));
    }

    Ok(minutes)
}
