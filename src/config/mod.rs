//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::grid::DEFAULT_GRID_SIZE;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Grid dimension; the board is grid_size x grid_size cells
    pub grid_size: u16,

    /// Allowed client origins for CORS, comma separated; "*" allows any
    pub client_origin: String,

    /// Claim journal file; unset runs without persistence
    pub journal_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        };

        let grid_size = match env::var("GRID_SIZE") {
            Ok(raw) => raw
                .parse::<u16>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidGridSize(raw))?,
            Err(_) => DEFAULT_GRID_SIZE,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            grid_size,

            client_origin: env::var("CLIENT_ORIGIN").unwrap_or_else(|_| "*".to_string()),

            journal_path: env::var("JOURNAL_PATH").ok().map(PathBuf::from),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid GRID_SIZE value: {0}")]
    InvalidGridSize(String),
}
