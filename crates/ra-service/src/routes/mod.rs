use crate::handlers::handshake_handler::{self, AppState};

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_routes(state: Arc<AppState>, metrics_handle: Option<PrometheusHandle>) -> Router {
    let mut router = Router::new()
        // Handshake endpoints
        .route("/userExists/:email", get(handshake_handler::check_user))
        .route("/tryConnect/:email", get(handshake_handler::try_connect))
        .route("/connect/:email", get(handshake_handler::connect))
        .route("/connectFromToken", post(handshake_handler::connect_from_token))
        .route("/authAnswer", post(handshake_handler::auth_answer))
        .route("/register", post(handshake_handler::register))
        // Health check
        .route("/health", get(health_check));

    if let Some(handle) = metrics_handle {
        router = router.route("/metrics", get(move || async move { handle.render() }));
    }

    router
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
