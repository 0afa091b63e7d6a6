//! Error types for the client crate.

use thiserror::Error;

/// Errors talking to an MCP server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server URL could not be parsed or joined.
    #[error("invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The message endpoint rejected a POST.
    #[error("server rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The SSE stream failed or sent something unexpected.
    #[error("SSE stream error: {0}")]
    Stream(String),

    /// The server answered with a JSON-RPC error.
    #[error("{message}")]
    Rpc { code: i32, message: String },

    /// No response arrived in time.
    #[error("timed out waiting for {0}")]
    Timeout(String),

    /// The session stream ended.
    #[error("connection closed")]
    Closed,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from a chat completion provider.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP-level failure.
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("completion API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The reply could not be decoded.
    #[error("failed to decode completion: {0}")]
    Decode(String),

    /// The reply had no choices.
    #[error("completion contained no choices")]
    NoChoices,
}

/// Errors that abort a chat turn.
///
/// Tool failures never do: they are folded into the conversation.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("message must not be empty")]
    EmptyMessage,
}
