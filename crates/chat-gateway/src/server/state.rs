//! Gateway state
//!
//! Application state for the gateway server.

use crate::gateway::Gateway;
use chat_common::AppConfig;
use std::sync::Arc;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server.
#[derive(Clone)]
pub struct GatewayState {
    /// Real-time layer shared by every connection
    gateway: Arc<Gateway>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(gateway: Arc<Gateway>, config: AppConfig) -> Self {
        Self {
            gateway,
            config: Arc::new(config),
        }
    }

    /// Get the gateway
    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("gateway", &self.gateway)
            .field("config", &"AppConfig")
            .finish()
    }
}
