//! Test server harness for end-to-end testing.
//!
//! Spawns a real service instance (full router, hub actor, token service)
//! bound to `127.0.0.1:0`, with a `wiremock` server standing in for the
//! user directory.

use ra_service::actors::hub::HubHandle;
use ra_service::clients::directory::DirectoryClient;
use ra_service::clients::push::PushClient;
use ra_service::handlers::handshake_handler::AppState;
use ra_service::routes;
use ra_service::services::token_service::TokenService;

use chrono::{Duration, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Signing secret shared by the spawned server and the token helpers below.
const TEST_SIGNING_SECRET: &[u8] = b"test-signing-secret-0123456789ab";

/// Short-lived token lifetime used by the spawned server.
pub const TEST_SHORT_TOKEN_MINUTES: i64 = 5;

/// Long-lived token lifetime used by the spawned server.
pub const TEST_LONG_TOKEN_MINUTES: i64 = 60;

/// Running test instance of the remote authentication service.
///
/// # Example
/// ```rust,ignore
/// let server = TestServer::spawn().await?;
/// server.mock_user_exists("a@x.com", true).await;
///
/// let response = reqwest::get(format!("{}/tryConnect/a@x.com", server.url())).await?;
/// assert_eq!(response.status(), 200);
/// ```
pub struct TestServer {
    addr: SocketAddr,
    /// Mocked user directory; mount additional expectations directly.
    pub directory: MockServer,
    /// Handle to the server's hub, for registry assertions.
    pub hub: HubHandle,
    tokens: TokenService,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Spawn a new server instance on an ephemeral port.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        let directory = MockServer::start().await;
        let hub = HubHandle::new();

        let state = Arc::new(AppState {
            hub: hub.clone(),
            tokens: TokenService::new(TEST_SIGNING_SECRET),
            directory: DirectoryClient::new(&directory.uri()),
            // No API key: push stays disabled in tests.
            push: PushClient::new(&format!("{}/fcm/send", directory.uri()), None),
            short_token_minutes: TEST_SHORT_TOKEN_MINUTES,
            long_token_minutes: TEST_LONG_TOKEN_MINUTES,
        });

        let app = routes::build_routes(state, None);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            directory,
            hub,
            tokens: TokenService::new(TEST_SIGNING_SECRET),
            _handle: handle,
        })
    }

    /// Base HTTP URL of the running server.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// WebSocket URL for the connect endpoint.
    #[must_use]
    pub fn ws_url(&self, email: &str, token: &str) -> String {
        format!("ws://{}/connect/{}?token={}", self.addr, email, token)
    }

    /// Issue a token with the server's signing secret.
    pub fn issue_token(&self, identity: &str, lifetime_minutes: i64) -> Result<String, anyhow::Error> {
        self.tokens
            .issue(identity, lifetime_minutes)
            .map_err(|e| anyhow::anyhow!("token issuance failed: {e}"))
    }

    /// Issue a token that expired ten minutes ago.
    pub fn issue_expired_token(&self, identity: &str) -> Result<String, anyhow::Error> {
        let issued = Utc::now() - Duration::minutes(15);
        self.tokens
            .issue_at(identity, 5, issued)
            .map_err(|e| anyhow::anyhow!("token issuance failed: {e}"))
    }

    /// Stub the directory's existence lookup for `email`.
    pub async fn mock_user_exists(&self, email: &str, exists: bool) {
        let records = if exists {
            serde_json::json!([{"id": "1", "email": email}])
        } else {
            serde_json::json!([])
        };

        Mock::given(method("GET"))
            .and(path(format!("/user/email/{email}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(records))
            .mount(&self.directory)
            .await;
    }

    /// Stub the directory's user-creation endpoint.
    pub async fn mock_create_user(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.directory)
            .await;
    }
}
