//! Chat completion interface.

use crate::conversation::{ChatMessage, ToolCall};
use crate::error::LlmError;
use async_trait::async_trait;
use sqlbridge_core::protocol::ToolDescriptor;

/// Whether the model may propose tool calls in this completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolPhase {
    /// Tools are offered; the model may call them.
    Propose,
    /// No tools are offered; the model must answer in text.
    Terminal,
}

/// One completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDescriptor>,
    pub phase: ToolPhase,
}

impl CompletionRequest {
    /// A request that offers `tools`.
    pub fn propose(messages: Vec<ChatMessage>, tools: Vec<ToolDescriptor>) -> Self {
        Self {
            messages,
            tools,
            phase: ToolPhase::Propose,
        }
    }

    /// A request that forces a text answer. Never carries tools.
    pub fn terminal(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            phase: ToolPhase::Terminal,
        }
    }
}

/// The assistant's reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl Completion {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
        }
    }
}

/// A chat completion backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError>;
}
