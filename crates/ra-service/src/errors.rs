use crate::services::token_service::TokenError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Service-level errors surfaced at the handshake boundary.
///
/// Token failures carry their precise cause internally (for logs) but are
/// rendered with a single generic message so callers cannot distinguish a
/// bad signature from an expired or mismatched token.
#[derive(Debug, Error)]
pub enum RaError {
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Directory service unreachable")]
    DirectoryUnreachable,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Registration refused by the directory service")]
    RegistrationFailed,

    #[error("Internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for RaError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            RaError::InvalidToken(reason) => {
                tracing::debug!(target: "ra.handshake", %reason, "token rejected");
                (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_TOKEN",
                    "The access token is invalid or expired".to_string(),
                )
            }
            RaError::DirectoryUnreachable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "DIRECTORY_UNAVAILABLE",
                "The user directory is currently unavailable".to_string(),
            ),
            RaError::UserAlreadyExists => (
                StatusCode::CONFLICT,
                "USER_EXISTS",
                "A user with this identity already exists".to_string(),
            ),
            RaError::RegistrationFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "REGISTRATION_FAILED",
                "Registration could not be completed".to_string(),
            ),
            RaError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}
