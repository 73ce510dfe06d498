//! Server configuration from environment variables.
//!
//! # Environment Variables
//!
//! - `CHIRP_BIND_ADDR`: Socket address to listen on. Default: `0.0.0.0:3000`
//! - `CHIRP_DB_PATH`: Path to the database file. Default: in-memory
//! - `CHIRP_MAX_CONNECTIONS`: Cap on concurrent chat connections. Default: `10000`

use std::net::SocketAddr;

use tracing::warn;

/// Runtime configuration for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to
    pub bind_addr: SocketAddr,
    /// Path to the database file (None for in-memory)
    pub db_path: Option<String>,
    /// Maximum number of concurrent chat connections
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            db_path: None,
            max_connections: 10_000,
        }
    }
}

impl ServerConfig {
    /// Build the configuration from the environment, falling back to
    /// defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = match std::env::var("CHIRP_BIND_ADDR") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "Invalid CHIRP_BIND_ADDR, using default");
                defaults.bind_addr
            }),
            Err(_) => defaults.bind_addr,
        };

        let db_path = std::env::var("CHIRP_DB_PATH").ok();

        let max_connections = match std::env::var("CHIRP_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "Invalid CHIRP_MAX_CONNECTIONS, using default");
                defaults.max_connections
            }),
            Err(_) => defaults.max_connections,
        };

        Self {
            bind_addr,
            db_path,
            max_connections,
        }
    }
}
