//! Error types for the MCP crate.

use sqlbridge_core::protocol::error_codes;
use thiserror::Error;

/// Errors that can occur in the MCP server.
#[derive(Debug, Error)]
pub enum McpError {
    /// Failed to start the server.
    #[error("failed to start MCP server: {0}")]
    StartupFailed(String),

    /// Invalid request format.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Tool not found.
    #[error("Tool not found: {name}")]
    ToolNotFound { name: String },

    /// Invalid arguments for tool.
    #[error("invalid arguments for tool {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The statement category is not allowed for this tool.
    #[error("{message}")]
    ForbiddenOperation { tool: String, message: String },

    /// No live session with this id.
    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    /// Transport error.
    #[error("transport error: {0}")]
    TransportError(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl McpError {
    /// JSON-RPC error code used when this error is returned to a caller.
    pub fn code(&self) -> i32 {
        match self {
            Self::ToolNotFound { .. } | Self::InvalidArguments { .. } => {
                error_codes::INVALID_PARAMS
            }
            Self::InvalidRequest(_) | Self::ForbiddenOperation { .. } => {
                error_codes::INVALID_REQUEST
            }
            Self::SerializationError(_) => error_codes::PARSE_ERROR,
            _ => error_codes::INTERNAL_ERROR,
        }
    }
}
