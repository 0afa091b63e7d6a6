//! Client and chat-loop configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the MCP client and the tool-calling chat loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the sqlbridge server (the SSE endpoint is `<base>/sse`).
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Chat model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Tool-proposing rounds before a final answer is forced.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    /// Optional system prompt placed at the head of every conversation.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            model: default_model(),
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            max_tool_rounds: default_max_tool_rounds(),
            system_prompt: None,
        }
    }
}

fn default_server_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_tool_rounds() -> usize {
    1
}
