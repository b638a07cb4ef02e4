//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    pub realtime: RealtimeConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            other => Err(ConfigError::InvalidValue("APP_ENV", other.to_string())),
        }
    }
}

/// Listener configuration for the gateway
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Tuning for the presence and fan-out layer
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Per-connection outbound queue capacity; a full queue drops the event
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
    /// Whether the `/internal/*` ingress and stats routes are mounted
    #[serde(default = "default_internal_ingress")]
    pub internal_ingress: bool,
    /// Upper bound on one user directory write, in milliseconds
    #[serde(default = "default_directory_timeout_ms")]
    pub directory_timeout_ms: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer: default_outbound_buffer(),
            internal_ingress: default_internal_ingress(),
            directory_timeout_ms: default_directory_timeout_ms(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "chat-gateway".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_internal_ingress() -> bool {
    true
}

fn default_directory_timeout_ms() -> u64 {
    5_000
}

/// Read an optional variable, failing only if it is present but unparsable
fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: parse_var("APP_ENV")?.unwrap_or_default(),
            },
            gateway: ServerConfig {
                host: env::var("GATEWAY_HOST").unwrap_or_else(|_| default_host()),
                port: parse_var("GATEWAY_PORT")?.ok_or(ConfigError::MissingVar("GATEWAY_PORT"))?,
            },
            realtime: RealtimeConfig {
                outbound_buffer: parse_var("GATEWAY_OUTBOUND_BUFFER")?
                    .unwrap_or_else(default_outbound_buffer),
                internal_ingress: parse_var("GATEWAY_INTERNAL_INGRESS")?
                    .unwrap_or_else(default_internal_ingress),
                directory_timeout_ms: parse_var("GATEWAY_DIRECTORY_TIMEOUT_MS")?
                    .unwrap_or_else(default_directory_timeout_ms),
            },
        })
    }

    /// Configuration for an ephemeral local listener, used by tests and demos
    #[must_use]
    pub fn local(port: u16) -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: Environment::Development,
            },
            gateway: ServerConfig {
                host: default_host(),
                port,
            },
            realtime: RealtimeConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
