//! Stateless bearer-token issuance and validation.
//!
//! Tokens are HS256-signed claims binding a client identity (`sub`) to an
//! expiry instant. Nothing is stored server-side; validity is entirely
//! self-contained, so validation runs lock-free under concurrent calls.
//!
//! The algorithm list is pinned to HS256: a token declaring any other
//! algorithm is rejected before signature verification, which defends
//! against algorithm-substitution attacks.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures of token issuance or validation.
///
/// All validation variants are rendered to callers with one generic message
/// (see `RaError`); the distinction exists for logs and tests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token could not be parsed")]
    Malformed,

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("token is expired")]
    Expired,

    #[error("token identity does not match")]
    IdentityMismatch,

    #[error("token signing failed")]
    Signing,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Client identity the token is bound to.
    sub: String,
    /// Expiry (Unix epoch seconds). Validation is strict: now >= exp fails.
    exp: i64,
    /// Issued-at (Unix epoch seconds).
    iat: i64,
}

/// Issues and validates identity tokens with a single symmetric secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked manually against an injectable clock so tests
        // can evaluate tokens at simulated instants.
        validation.validate_exp = false;
        validation.required_spec_claims = std::collections::HashSet::new();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token binding `identity` to an expiry `lifetime_minutes` from
    /// now.
    pub fn issue(&self, identity: &str, lifetime_minutes: i64) -> Result<String, TokenError> {
        self.issue_at(identity, lifetime_minutes, Utc::now())
    }

    /// Issue a token as of an explicit instant. Exposed for tests and the
    /// test harness, which use it to craft already-expired tokens.
    pub fn issue_at(
        &self,
        identity: &str,
        lifetime_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: identity.to_string(),
            exp: (now + Duration::minutes(lifetime_minutes)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| TokenError::Signing)
    }

    /// Validate `token` against `expected_identity` at the current time.
    ///
    /// On success returns the embedded identity (equal to
    /// `expected_identity`).
    pub fn validate(&self, token: &str, expected_identity: &str) -> Result<String, TokenError> {
        self.validate_at(token, expected_identity, Utc::now())
    }

    /// Validate `token` as of an explicit instant.
    pub fn validate_at(
        &self,
        token: &str,
        expected_identity: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(map_decode_error)?;

        if data.claims.sub != expected_identity {
            return Err(TokenError::IdentityMismatch);
        }

        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims.sub)
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        // A token declaring a different algorithm never reaches signature
        // verification; reject it the same way.
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            TokenError::InvalidSignature
        }
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}
