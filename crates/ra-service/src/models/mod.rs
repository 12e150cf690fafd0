//! Wire-format types for the handshake protocol.
//!
//! Field names are camelCase on the wire (`isAuthValid`, `exists`, ...) to
//! match what the clients of the observed protocol expect.

use serde::{Deserialize, Serialize};

/// Response for `GET /userExists/{email}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserExistsResponse {
    pub email: String,
    pub exists: bool,
}

/// Response for `GET /tryConnect/{email}`.
///
/// `token` is present only when the user exists.
#[derive(Debug, Serialize, Deserialize)]
pub struct TryConnectResponse {
    pub email: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Query parameters for `GET /connect/{email}`.
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub token: String,
}

/// Request body for `POST /connectFromToken`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectFromTokenRequest {
    pub email: String,
    pub token: String,
}

/// Response for `POST /connectFromToken`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectFromTokenResponse {
    pub email: String,
    pub is_auth_valid: bool,
}

/// Request body for `POST /authAnswer` — the out-of-band answer naming the
/// waiting client.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthAnswerRequest {
    pub client: String,
    pub is_auth_valid: bool,
}

/// The single message kind ever forwarded through a channel: the result of
/// the out-of-band authentication, plus a session token when affirmative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPacket {
    pub is_auth_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// One stroke of the hand-drawn signature captured at registration time.
#[derive(Debug, Serialize, Deserialize)]
pub struct Signature {
    pub abs: Vec<i64>,
    pub ord: Vec<i64>,
    pub time: Vec<i64>,
}

/// Request body for `POST /register`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub email: String,
    pub signatures: Vec<Signature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Response for `POST /register`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub is_registration_valid: bool,
}
