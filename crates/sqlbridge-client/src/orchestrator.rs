//! The tool-calling chat loop.
//!
//! One user turn:
//! 1. Append the user message
//! 2. Ask the model, offering the tool catalog
//! 3. No tool calls → append the reply, done
//! 4. Otherwise append the assistant message with its calls and run each call
//!    in order, appending one tool message per call
//! 5. Repeat from 2 until `max_tool_rounds` proposing rounds have run, then
//!    ask once more in the terminal phase (no tools) and append that reply
//!
//! Tool failures of any kind become tool messages so the model can explain
//! them; only a completion failure aborts the turn.

use crate::client::ToolClient;
use crate::conversation::{ChatMessage, Conversation, ToolCall};
use crate::error::{ClientError, OrchestratorError};
use crate::llm::{CompletionProvider, CompletionRequest};
use serde_json::{Map, Value};
use sqlbridge_core::config::ClientConfig;
use sqlbridge_core::protocol::{CallToolResult, ToolDescriptor};
use std::sync::Arc;

/// Loop settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Proposing rounds before the terminal phase is forced.
    pub max_tool_rounds: usize,
    /// Placed once at the head of the conversation.
    pub system_prompt: Option<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 1,
            system_prompt: None,
        }
    }
}

impl From<&ClientConfig> for OrchestratorConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_tool_rounds: config.max_tool_rounds,
            system_prompt: config.system_prompt.clone(),
        }
    }
}

/// Drives conversations between a model and remote tools.
///
/// `submit` takes `&mut self`, so at most one turn is in flight.
pub struct Orchestrator {
    llm: Arc<dyn CompletionProvider>,
    tools: Arc<dyn ToolClient>,
    catalog: Vec<ToolDescriptor>,
    conversation: Conversation,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn CompletionProvider>,
        tools: Arc<dyn ToolClient>,
        catalog: Vec<ToolDescriptor>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            llm,
            tools,
            catalog,
            conversation: Conversation::new(),
            config,
        }
    }

    /// Build an orchestrator whose catalog is fetched from `tools`.
    pub async fn load(
        llm: Arc<dyn CompletionProvider>,
        tools: Arc<dyn ToolClient>,
        config: OrchestratorConfig,
    ) -> Result<Self, ClientError> {
        let catalog = tools.list_tools().await?;
        tracing::info!(tools = catalog.len(), "Loaded tool catalog");
        Ok(Self::new(llm, tools, catalog, config))
    }

    pub fn catalog(&self) -> &[ToolDescriptor] {
        &self.catalog
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Forget the conversation.
    pub fn reset(&mut self) {
        self.conversation.clear();
    }

    /// Run one user turn and return the final assistant text.
    ///
    /// A failed turn leaves the conversation as it was before the call.
    pub async fn submit(&mut self, text: &str) -> Result<String, OrchestratorError> {
        if text.trim().is_empty() {
            return Err(OrchestratorError::EmptyMessage);
        }

        let checkpoint = self.conversation.len();
        let outcome = self.run_turn(text).await;
        if outcome.is_err() {
            tracing::warn!(
                dropped = self.conversation.len() - checkpoint,
                "Turn failed, rolling back conversation"
            );
            self.conversation.truncate(checkpoint);
        }
        outcome
    }

    async fn run_turn(&mut self, text: &str) -> Result<String, OrchestratorError> {
        if self.conversation.is_empty() {
            if let Some(prompt) = &self.config.system_prompt {
                self.conversation.push(ChatMessage::system(prompt.clone()));
            }
        }
        self.conversation.push(ChatMessage::user(text));

        let mut rounds = 0;
        while rounds < self.config.max_tool_rounds {
            let request = CompletionRequest::propose(
                self.conversation.messages().to_vec(),
                self.catalog.clone(),
            );
            let reply = self.llm.complete(request).await?;
            let content = reply.content.unwrap_or_default();

            if reply.tool_calls.is_empty() {
                self.conversation.push(ChatMessage::assistant(content.clone(), Vec::new()));
                return Ok(content);
            }

            tracing::info!(round = rounds + 1, calls = reply.tool_calls.len(), "Model proposed tool calls");
            self.conversation
                .push(ChatMessage::assistant(content, reply.tool_calls.clone()));

            for call in &reply.tool_calls {
                let output = self.run_tool(call).await;
                self.conversation.push(ChatMessage::tool(call, output));
            }

            rounds += 1;
        }

        let request = CompletionRequest::terminal(self.conversation.messages().to_vec());
        let reply = self.llm.complete(request).await?;
        let content = reply.content.unwrap_or_default();
        if !reply.tool_calls.is_empty() {
            tracing::warn!(calls = reply.tool_calls.len(), "Ignoring tool calls in terminal reply");
        }
        self.conversation.push(ChatMessage::assistant(content.clone(), Vec::new()));

        Ok(content)
    }

    async fn run_tool(&self, call: &ToolCall) -> String {
        let arguments = parse_arguments(&call.arguments);
        tracing::info!(tool = %call.name, call_id = %call.id, "Running tool");

        match self.tools.call_tool(&call.name, arguments).await {
            Ok(result) => fold_result(&result),
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool call failed");
                format!("Error: {}", e)
            }
        }
    }
}

/// Parse model-produced arguments. Anything but a JSON object yields an
/// empty map.
pub fn parse_arguments(raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) if raw.trim().is_empty() => Map::new(),
        Ok(other) => {
            tracing::warn!(arguments = %other, "Tool arguments are not an object, using none");
            Map::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Malformed tool arguments, using none");
            Map::new()
        }
    }
}

/// Text of a tool result as seen by the model.
pub fn fold_result(result: &CallToolResult) -> String {
    let text = result.joined_text();
    let text = if text.is_empty() && !result.content.is_empty() {
        serde_json::to_string(&result.content).unwrap_or_default()
    } else {
        text
    };

    if result.is_error {
        format!("Error: {}", text)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::error::LlmError;
    use crate::llm::{Completion, ToolPhase};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned completions and records every request.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Completion>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Completion>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| LlmError::Decode("script exhausted".to_string()))
        }
    }

    /// Answers every call from a fixed closure and records the calls.
    struct FakeTools {
        calls: Mutex<Vec<(String, Map<String, Value>)>>,
        respond: fn(&str) -> Result<CallToolResult, ClientError>,
    }

    impl FakeTools {
        fn new(respond: fn(&str) -> Result<CallToolResult, ClientError>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                respond,
            })
        }

        fn calls(&self) -> Vec<(String, Map<String, Value>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ToolClient for FakeTools {
        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ClientError> {
            Ok(vec![ToolDescriptor::new(
                "list_tables",
                "List all tables in the database",
                json!({ "type": "object", "properties": {} }),
            )])
        }

        async fn call_tool(
            &self,
            name: &str,
            arguments: Map<String, Value>,
        ) -> Result<CallToolResult, ClientError> {
            self.calls.lock().unwrap().push((name.to_string(), arguments));
            (self.respond)(name)
        }
    }

    fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    async fn orchestrator(
        llm: Arc<ScriptedProvider>,
        tools: Arc<FakeTools>,
        config: OrchestratorConfig,
    ) -> Orchestrator {
        Orchestrator::load(llm, tools, config).await.unwrap()
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let llm = ScriptedProvider::new(vec![Completion::text("hello")]);
        let tools = FakeTools::new(|_| Ok(CallToolResult::text("unused")));
        let mut orch = orchestrator(llm.clone(), tools.clone(), OrchestratorConfig::default()).await;

        assert_eq!(orch.submit("hi").await.unwrap(), "hello");

        let roles: Vec<_> = orch.conversation().messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert!(tools.calls().is_empty());
        assert_eq!(llm.requests().len(), 1);
        assert_eq!(llm.requests()[0].tools.len(), 1);
    }

    #[tokio::test]
    async fn test_one_tool_call_then_terminal_answer() {
        let llm = ScriptedProvider::new(vec![
            Completion::calls(vec![call("call_1", "list_tables", "{}")]),
            Completion::text("There is one table: users."),
        ]);
        let tools = FakeTools::new(|_| Ok(CallToolResult::text(r#"[{"table_name":"users"}]"#)));
        let mut orch = orchestrator(llm.clone(), tools, OrchestratorConfig::default()).await;

        let answer = orch.submit("what tables exist?").await.unwrap();
        assert_eq!(answer, "There is one table: users.");

        let messages = orch.conversation().messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].tool_calls.as_ref().unwrap()[0].id, "call_1");
        assert_eq!(messages[2].role, Role::Tool);
        assert_eq!(messages[2].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(messages[2].content, r#"[{"table_name":"users"}]"#);
        assert_eq!(messages[3].role, Role::Assistant);
        assert!(messages[3].tool_calls.is_none());
        assert!(orch.conversation().is_consistent());

        let requests = llm.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].phase, ToolPhase::Terminal);
        assert!(requests[1].tools.is_empty());
        assert_eq!(requests[1].messages.len(), 3);
    }

    #[tokio::test]
    async fn test_calls_run_sequentially_in_order() {
        let llm = ScriptedProvider::new(vec![
            Completion::calls(vec![
                call("a", "describe_table", r#"{"table_name":"users"}"#),
                call("b", "execute_query", r#"{"query":"SELECT 1"}"#),
            ]),
            Completion::text("done"),
        ]);
        let tools = FakeTools::new(|name| Ok(CallToolResult::text(name)));
        let mut orch = orchestrator(llm, tools.clone(), OrchestratorConfig::default()).await;

        orch.submit("go").await.unwrap();

        let calls = tools.calls();
        assert_eq!(calls[0].0, "describe_table");
        assert_eq!(calls[0].1["table_name"], "users");
        assert_eq!(calls[1].0, "execute_query");

        let tool_ids: Vec<_> = orch
            .conversation()
            .messages()
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        assert_eq!(tool_ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_malformed_arguments_become_empty_map() {
        let llm = ScriptedProvider::new(vec![
            Completion::calls(vec![call("a", "list_tables", "{not json")]),
            Completion::text("ok"),
        ]);
        let tools = FakeTools::new(|_| Ok(CallToolResult::text("[]")));
        let mut orch = orchestrator(llm, tools.clone(), OrchestratorConfig::default()).await;

        orch.submit("go").await.unwrap();
        assert!(tools.calls()[0].1.is_empty());
    }

    #[tokio::test]
    async fn test_tool_failures_are_folded_into_conversation() {
        let llm = ScriptedProvider::new(vec![
            Completion::calls(vec![
                call("a", "execute_query", r#"{"query":"drop table t"}"#),
                call("b", "describe_table", r#"{"table_name":"x-y"}"#),
            ]),
            Completion::text("Sorry, that is not allowed."),
        ]);
        let tools = FakeTools::new(|name| match name {
            "execute_query" => Err(ClientError::Rpc {
                code: -32600,
                message: "Only SELECT queries are allowed via execute_query".to_string(),
            }),
            _ => Ok(CallToolResult::error("Invalid table name.")),
        });
        let mut orch = orchestrator(llm, tools, OrchestratorConfig::default()).await;

        let answer = orch.submit("drop it").await.unwrap();
        assert_eq!(answer, "Sorry, that is not allowed.");

        let messages = orch.conversation().messages();
        assert_eq!(
            messages[2].content,
            "Error: Only SELECT queries are allowed via execute_query"
        );
        assert_eq!(messages[3].content, "Error: Invalid table name.");
    }

    #[tokio::test]
    async fn test_terminal_reply_tool_calls_are_dropped() {
        let llm = ScriptedProvider::new(vec![
            Completion::calls(vec![call("a", "list_tables", "{}")]),
            Completion {
                content: Some("final".to_string()),
                tool_calls: vec![call("b", "list_tables", "{}")],
            },
        ]);
        let tools = FakeTools::new(|_| Ok(CallToolResult::text("[]")));
        let mut orch = orchestrator(llm, tools.clone(), OrchestratorConfig::default()).await;

        assert_eq!(orch.submit("go").await.unwrap(), "final");
        assert_eq!(tools.calls().len(), 1);
        assert!(orch.conversation().last().unwrap().tool_calls.is_none());
    }

    #[tokio::test]
    async fn test_more_rounds_when_configured() {
        let llm = ScriptedProvider::new(vec![
            Completion::calls(vec![call("a", "list_tables", "{}")]),
            Completion::calls(vec![call("b", "describe_table", r#"{"table_name":"users"}"#)]),
            Completion::text("users has two columns"),
        ]);
        let tools = FakeTools::new(|_| Ok(CallToolResult::text("[]")));
        let config = OrchestratorConfig {
            max_tool_rounds: 2,
            system_prompt: None,
        };
        let mut orch = orchestrator(llm.clone(), tools.clone(), config).await;

        orch.submit("describe users").await.unwrap();

        assert_eq!(tools.calls().len(), 2);
        let phases: Vec<_> = llm.requests().iter().map(|r| r.phase).collect();
        assert_eq!(
            phases,
            vec![ToolPhase::Propose, ToolPhase::Propose, ToolPhase::Terminal]
        );
        assert!(orch.conversation().is_consistent());
    }

    #[tokio::test]
    async fn test_zero_rounds_goes_straight_to_terminal() {
        let llm = ScriptedProvider::new(vec![Completion::text("no tools here")]);
        let tools = FakeTools::new(|_| Ok(CallToolResult::text("[]")));
        let config = OrchestratorConfig {
            max_tool_rounds: 0,
            system_prompt: None,
        };
        let mut orch = orchestrator(llm.clone(), tools, config).await;

        orch.submit("hi").await.unwrap();
        assert_eq!(llm.requests()[0].phase, ToolPhase::Terminal);
    }

    #[tokio::test]
    async fn test_system_prompt_once_and_reset() {
        let llm = ScriptedProvider::new(vec![
            Completion::text("one"),
            Completion::text("two"),
            Completion::text("three"),
        ]);
        let tools = FakeTools::new(|_| Ok(CallToolResult::text("[]")));
        let config = OrchestratorConfig {
            max_tool_rounds: 1,
            system_prompt: Some("You are a database assistant.".to_string()),
        };
        let mut orch = orchestrator(llm, tools, config).await;

        orch.submit("a").await.unwrap();
        orch.submit("b").await.unwrap();
        let systems = orch
            .conversation()
            .messages()
            .iter()
            .filter(|m| m.role == Role::System)
            .count();
        assert_eq!(systems, 1);
        assert_eq!(orch.conversation().len(), 5);

        orch.reset();
        assert!(orch.conversation().is_empty());
        orch.submit("c").await.unwrap();
        assert_eq!(orch.conversation().messages()[0].role, Role::System);
    }

    #[tokio::test]
    async fn test_failed_turn_rolls_back() {
        let llm = ScriptedProvider::new(vec![
            Completion::text("first"),
            Completion::calls(vec![call("a", "list_tables", "{}")]),
        ]);
        let tools = FakeTools::new(|_| Ok(CallToolResult::text("[]")));
        let config = OrchestratorConfig {
            max_tool_rounds: 1,
            system_prompt: Some("You are a database assistant.".to_string()),
        };
        let mut orch = orchestrator(llm, tools.clone(), config).await;

        orch.submit("a").await.unwrap();
        let before = orch.conversation().clone();

        // The terminal completion is missing, so the provider fails mid-turn.
        assert!(matches!(
            orch.submit("b").await,
            Err(OrchestratorError::Llm(_))
        ));
        assert_eq!(tools.calls().len(), 1);
        assert_eq!(orch.conversation(), &before);
        assert!(orch.conversation().is_consistent());
    }

    #[tokio::test]
    async fn test_failed_first_turn_leaves_empty_conversation() {
        let llm = ScriptedProvider::new(Vec::new());
        let tools = FakeTools::new(|_| Ok(CallToolResult::text("[]")));
        let config = OrchestratorConfig {
            max_tool_rounds: 1,
            system_prompt: Some("You are a database assistant.".to_string()),
        };
        let mut orch = orchestrator(llm, tools, config).await;

        assert!(orch.submit("hi").await.is_err());
        assert!(orch.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let llm = ScriptedProvider::new(Vec::new());
        let tools = FakeTools::new(|_| Ok(CallToolResult::text("[]")));
        let mut orch = orchestrator(llm.clone(), tools, OrchestratorConfig::default()).await;

        assert!(matches!(
            orch.submit("   ").await,
            Err(OrchestratorError::EmptyMessage)
        ));
        assert!(llm.requests().is_empty());
        assert!(orch.conversation().is_empty());
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments(r#"{"a":1}"#)["a"], 1);
        assert!(parse_arguments("").is_empty());
        assert!(parse_arguments("[1,2]").is_empty());
        assert!(parse_arguments("{oops").is_empty());
    }

    #[test]
    fn test_fold_result() {
        assert_eq!(fold_result(&CallToolResult::text("ok")), "ok");
        assert_eq!(fold_result(&CallToolResult::error("bad")), "Error: bad");
    }
}
