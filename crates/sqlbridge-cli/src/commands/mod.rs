//! CLI command implementations for sqlbridge.

pub mod call;
pub mod chat;
pub mod serve;
pub mod tools;

use anyhow::{Context, Result};
use sqlbridge_client::McpClient;

/// Connect to a running server, preferring `--server` over the config file.
pub async fn connect(server: Option<&str>, configured: &str) -> Result<McpClient> {
    let base_url = server.unwrap_or(configured);
    McpClient::connect(base_url)
        .await
        .with_context(|| format!("Failed to connect to MCP server at {}", base_url))
}
