//! # sqlbridge-mcp
//!
//! MCP (Model Context Protocol) server exposing a SQL database as a small,
//! fixed set of tools for AI agents.
//!
//! ## Architecture
//!
//! ```text
//! AI agent / sqlbridge client
//!       │
//!       │ GET /sse  ───────────────► endpoint event (/message?sessionId=…)
//!       │ POST /message?sessionId=…  JSON-RPC request, 202 Accepted
//!       ▼
//! ┌──────────────────────┐
//! │  SessionRegistry     │  one in-order worker per session
//! │  McpServer           │  initialize / tools/list / tools/call
//! │  ToolExecutor        │  validate arguments, dispatch by name
//! │  ToolHandler         │  statement-category check, run SQL
//! └──────────┬───────────┘
//!            │
//!            ▼
//!      Database (Postgres)
//! ```
//!
//! ## Tools
//!
//! | Tool | Required | Description |
//! |------|----------|-------------|
//! | `say_hi` | `message` | Answers "hi" |
//! | `list_tables` | | Base tables outside system schemas |
//! | `describe_table` | `table_name` | Column metadata |
//! | `execute_query` | `query` | `SELECT` statements only |
//! | `execute_update` | `query` | `INSERT`/`UPDATE`/`DELETE`/`CREATE`/`DROP` only |
//!
//! ## Example Usage
//!
//! ```ignore
//! use sqlbridge_adapter_pg::PostgresDatabase;
//! use sqlbridge_core::ServerConfig;
//! use sqlbridge_mcp::{McpServer, ToolExecutor};
//! use std::sync::Arc;
//!
//! let db = PostgresDatabase::connect(&url, 5).await?;
//! let executor = ToolExecutor::with_builtin_tools(Arc::new(db));
//! let server = Arc::new(McpServer::new(ServerConfig::default(), executor));
//! server.run(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```

pub mod catalog;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod http_transport;
pub mod server;
pub mod session;
pub mod tools;

#[cfg(test)]
mod testing;

pub use error::McpError;
pub use executor::ToolExecutor;
pub use handlers::{StatementPolicy, ToolHandler};
pub use http_transport::{HttpServer, HttpTransportState, create_router};
pub use server::McpServer;
pub use session::{RequestHandler, SessionRegistry, SseEvent};
pub use tools::ToolRegistry;
