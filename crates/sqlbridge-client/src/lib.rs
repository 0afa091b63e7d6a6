//! # sqlbridge-client
//!
//! Client side of sqlbridge:
//!
//! - **Transport**: SSE session with request/response correlation by id
//! - **McpClient**: initialize handshake, `tools/list`, `tools/call`
//! - **Orchestrator**: the chat loop that lets a model call tools, then
//!   forces a final text answer
//! - **OpenAiProvider**: any OpenAI-compatible `chat/completions` endpoint
//! - **render**: display formatting with size truncation

pub mod client;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod render;
pub mod transport;

pub use client::{McpClient, ToolClient};
pub use conversation::{ChatMessage, Conversation, Role, ToolCall};
pub use error::{ClientError, LlmError, OrchestratorError};
pub use llm::{Completion, CompletionProvider, CompletionRequest, ToolPhase};
pub use openai::OpenAiProvider;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use render::render_result;
pub use transport::SseTransport;
