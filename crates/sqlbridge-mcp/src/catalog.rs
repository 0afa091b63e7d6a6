//! The built-in tool catalog.

use crate::handlers::{DescribeTable, ExecuteQuery, ExecuteUpdate, ListTables, SayHi, ToolHandler};
use serde_json::json;
use sqlbridge_core::protocol::ToolDescriptor;
use std::sync::Arc;

/// Built-in tools with their handlers, in listing order.
pub fn builtin_tools() -> Vec<(ToolDescriptor, Arc<dyn ToolHandler>)> {
    vec![
        (
            ToolDescriptor::new(
                "say_hi",
                "Responds to hi",
                json!({
                    "type": "object",
                    "properties": {
                        "message": {
                            "type": "string",
                            "description": "The message from the user"
                        }
                    },
                    "required": ["message"]
                }),
            ),
            Arc::new(SayHi),
        ),
        (
            ToolDescriptor::new(
                "list_tables",
                "List all tables in the database",
                json!({ "type": "object", "properties": {} }),
            ),
            Arc::new(ListTables),
        ),
        (
            ToolDescriptor::new(
                "describe_table",
                "Get schema information for a table",
                json!({
                    "type": "object",
                    "properties": { "table_name": { "type": "string" } },
                    "required": ["table_name"]
                }),
            ),
            Arc::new(DescribeTable),
        ),
        (
            ToolDescriptor::new(
                "execute_query",
                "Execute a SELECT query",
                json!({
                    "type": "object",
                    "properties": { "query": { "type": "string" } },
                    "required": ["query"]
                }),
            ),
            Arc::new(ExecuteQuery),
        ),
        (
            ToolDescriptor::new(
                "execute_update",
                "Execute an INSERT/UPDATE/DELETE/CREATE/DROP query",
                json!({
                    "type": "object",
                    "properties": { "query": { "type": "string" } },
                    "required": ["query"]
                }),
            ),
            Arc::new(ExecuteUpdate),
        ),
    ]
}
