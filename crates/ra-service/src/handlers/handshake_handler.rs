//! Handshake coordinator: the request handlers composing the token
//! service, the hub and the external collaborators.
//!
//! Protocol states, end to end: unauthenticated → token issued
//! (`tryConnect`) → channel open (`connect`, token validated before the
//! upgrade) → awaiting answer → answered (`authAnswer` delivers through the
//! hub) → closed.

use crate::actors::channel;
use crate::actors::hub::HubHandle;
use crate::clients::directory::{ClientError, DirectoryClient};
use crate::clients::push::PushClient;
use crate::errors::RaError;
use crate::models::{
    AnswerPacket, AuthAnswerRequest, ConnectFromTokenRequest, ConnectFromTokenResponse,
    ConnectParams, RegistrationRequest, RegistrationResponse, TryConnectResponse,
    UserExistsResponse,
};
use crate::observability::metrics as handshake_metrics;
use crate::services::token_service::TokenService;

use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::Response,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Notification shown on the secondary device when a connect is pending.
const PUSH_TITLE: &str = "FunConnect";
const PUSH_BODY: &str = "Connect to your app";

/// Application state shared across handlers.
pub struct AppState {
    pub hub: HubHandle,
    pub tokens: TokenService,
    pub directory: DirectoryClient,
    pub push: PushClient,
    pub short_token_minutes: i64,
    pub long_token_minutes: i64,
}

impl From<ClientError> for RaError {
    fn from(err: ClientError) -> Self {
        warn!(target: "ra.handshake", error = %err, "directory call failed");
        RaError::DirectoryUnreachable
    }
}

/// Existence probe.
///
/// GET /userExists/{email}
pub async fn check_user(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<UserExistsResponse>, RaError> {
    let exists = state.directory.exists(&email).await?;
    Ok(Json(UserExistsResponse { email, exists }))
}

/// Start a handshake: confirm the identity exists, mint the short-lived
/// connect token and prompt the secondary device.
///
/// GET /tryConnect/{email}
pub async fn try_connect(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<TryConnectResponse>, RaError> {
    let exists = state.directory.exists(&email).await?;

    let token = if exists {
        let token = state
            .tokens
            .issue(&email, state.short_token_minutes)
            .map_err(|_| RaError::Internal)?;
        handshake_metrics::record_token_issued("short");

        // Best effort; a lost notification only means the user confirms
        // through another path.
        let push = state.push.clone();
        let destination = email.clone();
        tokio::spawn(async move {
            push.notify(&destination, PUSH_TITLE, PUSH_BODY).await;
        });

        Some(token)
    } else {
        None
    };

    Ok(Json(TryConnectResponse {
        email,
        exists,
        token,
    }))
}

/// Open the waiting channel. The token is validated before the upgrade;
/// on failure the upgrade is refused and no channel resource exists.
///
/// GET /connect/{email}?token=...
pub async fn connect(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> Result<Response, RaError> {
    let identity = match state.tokens.validate(&params.token, &email) {
        Ok(identity) => {
            handshake_metrics::record_token_validation("success");
            identity
        }
        Err(e) => {
            handshake_metrics::record_token_validation("error");
            return Err(e.into());
        }
    };

    info!(target: "ra.handshake", identity = %identity, "connection upgrade accepted");

    let hub = state.hub.clone();
    Ok(ws.on_upgrade(move |socket| channel::run_session(socket, identity, hub)))
}

/// Exchange a previously issued token for re-validation. Pure validation,
/// no registry interaction.
///
/// POST /connectFromToken
pub async fn connect_from_token(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConnectFromTokenRequest>,
) -> Result<Json<ConnectFromTokenResponse>, RaError> {
    match state.tokens.validate(&request.token, &request.email) {
        Ok(email) => {
            handshake_metrics::record_token_validation("success");
            Ok(Json(ConnectFromTokenResponse {
                email,
                is_auth_valid: true,
            }))
        }
        Err(e) => {
            handshake_metrics::record_token_validation("error");
            Err(e.into())
        }
    }
}

/// Accept the out-of-band answer and forward it to the waiting channel.
/// Fire-and-forget at this boundary: returns 200 whether or not a channel
/// was found.
///
/// POST /authAnswer
pub async fn auth_answer(
    State(state): State<Arc<AppState>>,
    Json(answer): Json<AuthAnswerRequest>,
) -> Result<StatusCode, RaError> {
    // The session token exists only for affirmative answers.
    let token = if answer.is_auth_valid {
        let token = state
            .tokens
            .issue(&answer.client, state.long_token_minutes)
            .map_err(|_| RaError::Internal)?;
        handshake_metrics::record_token_issued("long");
        Some(token)
    } else {
        None
    };

    let packet = AnswerPacket {
        is_auth_valid: answer.is_auth_valid,
        token,
    };

    let delivered = state
        .hub
        .deliver(&answer.client, packet)
        .await
        .map_err(|_| RaError::Internal)?;

    if !delivered {
        // Expected when the client already disconnected; the answer is
        // dropped without redelivery.
        debug!(target: "ra.handshake", client = %answer.client, "answer arrived with no channel waiting");
    }

    Ok(StatusCode::OK)
}

/// Register a new user with the directory.
///
/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegistrationRequest>,
) -> Result<Json<RegistrationResponse>, RaError> {
    if state.directory.exists(&request.email).await? {
        return Err(RaError::UserAlreadyExists);
    }

    if !state.directory.create_user(&request).await? {
        return Err(RaError::RegistrationFailed);
    }

    Ok(Json(RegistrationResponse {
        is_registration_valid: true,
    }))
}
