//! Gateway server setup
//!
//! Provides the WebSocket server configuration and routes.

mod handler;
mod ingress;
mod state;

pub use handler::gateway_handler;
pub use ingress::{FanoutResponse, IngressError};
pub use state::GatewayState;

use crate::directory::NoopUserDirectory;
use crate::gateway::Gateway;
use crate::presence::PresencePump;
use axum::{
    routing::{get, post},
    Router,
};
use chat_common::{AppConfig, AppError, AppResult};
use chat_core::UserDirectory;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router
///
/// The `/internal` routes are only mounted when `internal_ingress` is set.
pub fn create_router(internal_ingress: bool) -> Router<GatewayState> {
    let router = Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check));

    if !internal_ingress {
        return router;
    }

    router
        .route("/internal/stats", get(ingress::stats))
        .route("/internal/presence/:user_id", get(ingress::user_presence))
        .route("/internal/messages/created", post(ingress::message_created))
        .route("/internal/messages/updated", post(ingress::message_updated))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router(state.config().realtime.internal_ingress)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the gateway and its state
///
/// The returned pump must be started for presence updates to flow.
pub fn create_gateway_state(
    config: AppConfig,
    directory: Arc<dyn UserDirectory>,
) -> (GatewayState, PresencePump) {
    let (gateway, pump) = Gateway::new(directory, config.realtime.outbound_buffer);
    let pump = pump.with_directory_timeout(Duration::from_millis(config.realtime.directory_timeout_ms));
    (GatewayState::new(gateway, config), pump)
}

/// Serve the application until `shutdown` resolves
pub async fn run_server<F>(listener: TcpListener, app: Router, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| AppError::Transport(format!("Failed to read local address: {e}")))?;

    tracing::info!("Gateway listening on ws://{}/gateway", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::Transport(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> AppResult<()> {
    let addr = config.gateway.address();

    let (state, pump) = create_gateway_state(config, Arc::new(NoopUserDirectory));
    let pump_handle = pump.start();

    let app = create_app(state);

    tracing::info!("Starting Gateway server on {}", addr);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    let result = run_server(listener, app, shutdown_signal()).await;

    pump_handle.abort();
    tracing::info!("Gateway shut down");

    result
}

/// Resolve on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
