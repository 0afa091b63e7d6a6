//! MCP server implementation.
//!
//! [`McpServer`] answers JSON-RPC requests against a [`ToolExecutor`] and
//! runs one of two transports: SSE sessions over HTTP, or a single implicit
//! session on stdin/stdout.

use crate::error::McpError;
use crate::executor::ToolExecutor;
use crate::http_transport::HttpServer;
use crate::session::{RequestHandler, SessionRegistry};
use async_trait::async_trait;
use serde_json::{Value, json};
use sqlbridge_core::config::{ServerConfig, Transport};
use sqlbridge_core::protocol::{
    CallToolParams, JSONRPC_VERSION, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
    PROTOCOL_VERSION, error_codes,
};
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// The MCP server.
pub struct McpServer {
    config: ServerConfig,
    executor: ToolExecutor,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    pub fn new(config: ServerConfig, executor: ToolExecutor) -> Self {
        Self { config, executor }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    /// Start the configured transport and run until `shutdown` resolves or,
    /// for stdio, until stdin is closed.
    pub async fn run<F>(self: Arc<Self>, shutdown: F) -> Result<(), McpError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self.config.transport {
            Transport::Stdio => self.run_stdio().await,
            Transport::Sse => self.run_sse(shutdown).await,
        }
    }

    /// Run the server with the SSE transport.
    pub async fn run_sse<F>(self: Arc<Self>, shutdown: F) -> Result<(), McpError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(
            addr = %self.config.bind_addr(),
            tools = self.executor.registry().len(),
            "Starting MCP server with SSE transport"
        );

        let sessions = SessionRegistry::new(self.clone(), self.config.session_buffer);
        let server = HttpServer::bind(&self.config.bind_addr(), sessions).await?;
        server.serve(shutdown).await
    }

    /// Run the server with stdio transport.
    ///
    /// Every line is one JSON-RPC message. Logs must go to stderr; stdout
    /// carries only responses.
    pub async fn run_stdio(&self) -> Result<(), McpError> {
        tracing::info!(
            tools = self.executor.registry().len(),
            "Starting MCP server with stdio transport"
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    tracing::warn!(error = %e, "Unparseable message on stdin");
                    Some(JsonRpcResponse::error(
                        None,
                        error_codes::PARSE_ERROR,
                        format!("Parse error: {}", e),
                    ))
                }
            };

            if let Some(response) = response {
                let mut out = serde_json::to_vec(&response)?;
                out.push(b'\n');
                stdout.write_all(&out).await?;
                stdout.flush().await?;
            }
        }

        tracing::info!("stdin closed, stopping MCP server");
        Ok(())
    }

    /// Handle a JSON-RPC request. Notifications never produce a response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let notification = request.is_notification();
        let id = request.id.clone();

        if request.jsonrpc != JSONRPC_VERSION {
            let err = McpError::InvalidRequest(format!(
                "unsupported jsonrpc version '{}'",
                request.jsonrpc
            ));
            return (!notification).then(|| JsonRpcResponse::error(id, err.code(), err.to_string()));
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "notifications/initialized" | "initialized" => {
                tracing::debug!("Client initialized");
                JsonRpcResponse::success(id, json!({}))
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            other => {
                tracing::debug!(method = %other, "Unknown method");
                JsonRpcResponse::error(
                    id,
                    error_codes::METHOD_NOT_FOUND,
                    format!("Method not found: {}", other),
                )
            }
        };

        if notification { None } else { Some(response) }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": "sqlbridge",
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {
                "tools": {}
            }
        });
        JsonRpcResponse::success(id, result)
    }

    fn handle_list_tools(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = ListToolsResult {
            tools: self.executor.registry().list().to_vec(),
        };
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
        }
    }

    async fn handle_call_tool(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        error_codes::INVALID_PARAMS,
                        format!("Invalid params: {}", e),
                    );
                }
            },
            None => return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, "Missing params"),
        };

        match self.executor.call(&params.name, &params.arguments).await {
            Ok(result) => match serde_json::to_value(result) {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(e) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
            },
            Err(e) => JsonRpcResponse::error(id, e.code(), e.to_string()),
        }
    }
}

#[async_trait]
impl RequestHandler for McpServer {
    async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        self.handle_request(request).await
    }
}
