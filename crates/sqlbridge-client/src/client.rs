//! MCP client.

use crate::error::ClientError;
use crate::transport::SseTransport;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use sqlbridge_core::protocol::{CallToolResult, ListToolsResult, PROTOCOL_VERSION, ToolDescriptor};

/// Remote tool access, as used by the chat loop.
#[async_trait]
pub trait ToolClient: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ClientError>;

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallToolResult, ClientError>;
}

/// An initialized MCP session over SSE.
pub struct McpClient {
    transport: SseTransport,
    server_info: Value,
}

impl McpClient {
    /// Connect to `<base_url>/sse` and perform the initialize handshake.
    pub async fn connect(base_url: &str) -> Result<Self, ClientError> {
        let transport = SseTransport::connect(base_url).await?;

        let init = transport
            .request(
                "initialize",
                Some(json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": "sqlbridge-client",
                        "version": env!("CARGO_PKG_VERSION")
                    }
                })),
            )
            .await?;
        transport.notify("notifications/initialized", None).await?;

        let server_info = init.get("serverInfo").cloned().unwrap_or(Value::Null);
        tracing::info!(
            server = %server_info["name"].as_str().unwrap_or("unknown"),
            protocol = %init["protocolVersion"].as_str().unwrap_or("unknown"),
            "Connected to MCP server"
        );

        Ok(Self {
            transport,
            server_info,
        })
    }

    /// `serverInfo` from the initialize response.
    pub fn server_info(&self) -> &Value {
        &self.server_info
    }

    pub fn transport(&self) -> &SseTransport {
        &self.transport
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        self.transport.request("ping", None).await.map(|_| ())
    }
}

#[async_trait]
impl ToolClient for McpClient {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ClientError> {
        let result = self.transport.request("tools/list", None).await?;
        let listed: ListToolsResult = serde_json::from_value(result)?;
        Ok(listed.tools)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallToolResult, ClientError> {
        tracing::debug!(tool = %name, "Calling tool");
        let result = self
            .transport
            .request(
                "tools/call",
                Some(json!({ "name": name, "arguments": arguments })),
            )
            .await?;
        Ok(serde_json::from_value(result)?)
    }
}
