//! Chat Gateway Server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p chat-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use chat_common::{try_init_tracing, try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let _ = try_init_tracing();
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    // Initialize tracing
    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        app = %config.app.name,
        env = ?config.app.env,
        port = config.gateway.port,
        internal_ingress = config.realtime.internal_ingress,
        "Configuration loaded"
    );

    if let Err(e) = chat_gateway::run(config).await {
        error!(error = %e, "Gateway failed");
        std::process::exit(1);
    }
}
