//! Configuration management for the portal application.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Authentication and session configuration.
    pub auth: AuthConfig,
    /// Blob storage configuration.
    pub storage: StorageConfig,
    /// WebSocket configuration for live registration counts.
    pub websocket: WebsocketConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Upper bound in seconds on waiting for the identity service's initial
    /// session signal; past it the auth state resolves to anonymous with a
    /// diagnostic rather than hanging.
    pub session_resolve_timeout: u64,
    /// Enrollment key a signup must present to receive the coordinator role.
    ///
    /// A single shared static key is a weak gate — it exists to keep casual
    /// signups out of the coordinator role, not to stop a determined
    /// attacker. It is at least held server-side and configurable, never
    /// embedded in client code.
    pub coordinator_enrollment_key: String,
}

/// Blob storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path prefix under which event images are uploaded.
    pub image_prefix: String,
}

/// WebSocket configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsocketConfig {
    /// Maximum concurrent live-count connections per server instance.
    pub max_connections: usize,
    /// Keep-alive ping interval in seconds.
    pub ping_interval: u64,
    /// Idle timeout in seconds before a silent connection is dropped.
    pub idle_timeout: u64,
}

impl Config {
    /// Load configuration from environment variables, defaulting every
    /// missing or unparsable value.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8080),
                log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            },
            auth: AuthConfig {
                session_resolve_timeout: env::var("AUTH_SESSION_RESOLVE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                coordinator_enrollment_key: env::var("COORDINATOR_ENROLLMENT_KEY")
                    .unwrap_or_else(|_| "dev-enrollment-key-change-me".to_string()),
            },
            storage: StorageConfig {
                image_prefix: env::var("IMAGE_PREFIX")
                    .unwrap_or_else(|_| "event_images".to_string()),
            },
            websocket: WebsocketConfig {
                max_connections: env::var("WS_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
                ping_interval: env::var("WS_PING_INTERVAL")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
                idle_timeout: env::var("WS_IDLE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
