//! # sqlbridge-core
//!
//! Types shared by the sqlbridge server, client and CLI:
//!
//! - **Protocol**: JSON-RPC envelopes and the MCP tool types (`ToolDescriptor`,
//!   `ToolContent`, `CallToolResult`)
//! - **Arguments**: the tagged value model tool handlers receive
//! - **Validator**: required-field checks and array coercion against a tool's
//!   input schema
//! - **Database**: the backing-resource contract implemented by adapters
//! - **Config**: `sqlbridge.toml` sections for server, database and client

pub mod arguments;
pub mod config;
pub mod database;
pub mod protocol;
pub mod validator;

pub use arguments::{ArgValue, ToolArguments};
pub use config::{
    ClientConfig, ConfigError, DatabaseConfig, ServerConfig, SqlbridgeConfig, Transport,
};
pub use database::{Database, DatabaseError, ExecOutcome, FieldInfo, QueryOutput, Row};
pub use protocol::{
    CallToolParams, CallToolResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, ToolContent, ToolDescriptor,
};
pub use validator::{ValidationError, validate_arguments, validate_identifier};
