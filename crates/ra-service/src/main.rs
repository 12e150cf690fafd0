use ra_service::actors::hub::HubHandle;
use ra_service::clients::directory::DirectoryClient;
use ra_service::clients::push::PushClient;
use ra_service::config::Config;
use ra_service::handlers::handshake_handler::AppState;
use ra_service::services::token_service::TokenService;
use ra_service::{observability, routes};

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ra_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Remote Auth service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    let metrics_handle = observability::install_prometheus_recorder();

    let state = Arc::new(AppState {
        hub: HubHandle::new(),
        tokens: TokenService::new(&config.signing_secret),
        directory: DirectoryClient::new(&config.directory_service_url),
        push: PushClient::new(&config.push_service_url, config.push_service_key.clone()),
        short_token_minutes: config.short_token_minutes,
        long_token_minutes: config.long_token_minutes,
    });

    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Remote Auth service listening on {}", addr);

    // Failing to bind is the only fatal error in the service.
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
