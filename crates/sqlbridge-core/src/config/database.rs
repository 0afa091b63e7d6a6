//! Backing database connection settings.

use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for the upstream database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// Connection URL. Takes precedence over `url_env`.
    #[serde(default)]
    pub url: Option<String>,

    /// Environment variable holding the connection URL.
    #[serde(default = "default_url_env")]
    pub url_env: String,

    /// Pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            url_env: default_url_env(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// Resolve the connection URL from the config or the environment.
    pub fn resolve_url(&self) -> Option<String> {
        self.url
            .clone()
            .or_else(|| env::var(&self.url_env).ok())
            .filter(|url| !url.trim().is_empty())
    }
}

fn default_url_env() -> String {
    "DATABASE_URL".to_string()
}

fn default_max_connections() -> u32 {
    5
}
