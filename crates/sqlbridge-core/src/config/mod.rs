//! Configuration types for sqlbridge.
//!
//! Everything lives in one `sqlbridge.toml`:
//!
//! ```toml
//! [server]
//! transport = "sse"
//! port = 3001
//!
//! [database]
//! url_env = "DATABASE_URL"
//!
//! [client]
//! model = "gpt-4o-mini"
//! max_tool_rounds = 1
//! ```
//!
//! Every field has a default, so an empty file (or no file) is valid.

pub mod client;
pub mod database;
pub mod server;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub use client::ClientConfig;
pub use database::DatabaseConfig;
pub use server::{ServerConfig, Transport};

/// Complete sqlbridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SqlbridgeConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl SqlbridgeConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Load configuration from a TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
