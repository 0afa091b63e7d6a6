//! MCP server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Transport type: "sse" or "stdio".
    #[serde(default)]
    pub transport: Transport,

    /// HTTP bind host (only used with the SSE transport).
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port (only used with the SSE transport).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Capacity of each session's outbound event queue.
    #[serde(default = "default_session_buffer")]
    pub session_buffer: usize,
}

/// MCP transport type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Long-lived SSE stream plus a POST message endpoint.
    #[default]
    Sse,
    /// Line-delimited JSON-RPC on stdin/stdout.
    Stdio,
}

impl std::str::FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sse" | "http" => Ok(Self::Sse),
            "stdio" => Ok(Self::Stdio),
            other => Err(format!("unknown transport: {other}. Use 'sse' or 'stdio'")),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            host: default_host(),
            port: default_port(),
            session_buffer: default_session_buffer(),
        }
    }
}

impl ServerConfig {
    /// `host:port` for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_session_buffer() -> usize {
    100
}
