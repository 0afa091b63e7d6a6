//! Built-in tool handlers.
//!
//! Each handler receives arguments that already passed schema validation.
//! Backing-resource failures become `isError` results; only a forbidden
//! statement category is raised, as [`McpError::ForbiddenOperation`].

use crate::error::McpError;
use async_trait::async_trait;
use sqlbridge_core::arguments::ToolArguments;
use sqlbridge_core::database::{Database, DatabaseError};
use sqlbridge_core::protocol::CallToolResult;
use sqlbridge_core::validator::validate_identifier;

/// A tool implementation, looked up by name at dispatch time.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(
        &self,
        args: &ToolArguments,
        db: &dyn Database,
    ) -> Result<CallToolResult, McpError>;
}

/// Statement prefixes a query tool accepts.
#[derive(Debug, Clone, Copy)]
pub struct StatementPolicy {
    allowed: &'static [&'static str],
}

impl StatementPolicy {
    pub const READ: Self = Self {
        allowed: &["SELECT"],
    };

    pub const WRITE: Self = Self {
        allowed: &["INSERT", "UPDATE", "DELETE", "CREATE", "DROP"],
    };

    /// Case-insensitive prefix check on the trimmed statement.
    pub fn permits(&self, query: &str) -> bool {
        let upper = query.trim().to_uppercase();
        self.allowed.iter().any(|prefix| upper.starts_with(prefix))
    }
}

fn required_str<'a>(
    tool: &str,
    args: &'a ToolArguments,
    field: &str,
) -> Result<&'a str, McpError> {
    args.str(field).ok_or_else(|| McpError::InvalidArguments {
        tool: tool.to_string(),
        reason: format!("'{}' must be a string", field),
    })
}

/// `say_hi`: answers "hi", explains itself otherwise.
pub struct SayHi;

#[async_trait]
impl ToolHandler for SayHi {
    async fn call(
        &self,
        args: &ToolArguments,
        _db: &dyn Database,
    ) -> Result<CallToolResult, McpError> {
        let message = match args.get("message") {
            Some(value) => match value.as_str() {
                Some(s) => s.to_string(),
                None => serde_json::Value::from(value.clone()).to_string(),
            },
            None => String::new(),
        };
        tracing::info!(message = %message, "Received message");

        if message == "hi" {
            Ok(CallToolResult::text("hi im there"))
        } else {
            Ok(CallToolResult::text(format!(
                "You said {}, but I only respond to 'hi'",
                message
            )))
        }
    }
}

/// Schemas hidden from `list_tables` and `describe_table`.
const SYSTEM_SCHEMAS: &str = "'pg_catalog', 'information_schema'";

fn list_tables_sql() -> String {
    format!(
        "SELECT table_schema::text AS table_schema, table_name::text AS table_name \
         FROM information_schema.tables \
         WHERE table_type = 'BASE TABLE' AND table_schema NOT IN ({}) \
         ORDER BY table_schema, table_name",
        SYSTEM_SCHEMAS
    )
}

/// `list_tables`: base tables outside the system schemas.
pub struct ListTables;

#[async_trait]
impl ToolHandler for ListTables {
    async fn call(
        &self,
        _args: &ToolArguments,
        db: &dyn Database,
    ) -> Result<CallToolResult, McpError> {
        match db.query(&list_tables_sql()).await {
            Ok(out) => Ok(CallToolResult::json(&out.rows_json())),
            Err(e) => Ok(CallToolResult::error(format!("Error listing tables: {}", e))),
        }
    }
}

/// `describe_table`: column metadata for one table.
///
/// The table is resolved over the same schemas `list_tables` shows. When
/// several schemas hold the name, `current_schema()` wins, then the first
/// schema alphabetically.
pub struct DescribeTable;

impl DescribeTable {
    fn resolve_sql(table: &str) -> String {
        format!(
            "SELECT table_schema::text AS table_schema \
             FROM information_schema.tables \
             WHERE table_type = 'BASE TABLE' AND table_schema NOT IN ({}) \
             AND table_name = '{}' \
             ORDER BY (table_schema::text = current_schema()::text) DESC, table_schema \
             LIMIT 1",
            SYSTEM_SCHEMAS, table
        )
    }

    fn columns_sql(schema: &str, table: &str) -> String {
        format!(
            "SELECT column_name::text AS column_name, data_type::text AS data_type, \
             is_nullable::text AS is_nullable, column_default::text AS column_default \
             FROM information_schema.columns \
             WHERE table_schema = '{}' AND table_name = '{}' \
             ORDER BY ordinal_position",
            schema.replace('\'', "''"),
            table
        )
    }

    async fn describe(table: &str, db: &dyn Database) -> Result<CallToolResult, DatabaseError> {
        let resolved = db.query(&Self::resolve_sql(table)).await?;
        let Some(schema) = resolved
            .rows
            .first()
            .and_then(|row| row.get("table_schema"))
            .and_then(|v| v.as_str())
        else {
            return Ok(CallToolResult::error(format!(
                "Error describing table: table '{}' does not exist",
                table
            )));
        };

        let columns = db.query(&Self::columns_sql(schema, table)).await?;
        Ok(CallToolResult::json(&columns.rows_json()))
    }
}

#[async_trait]
impl ToolHandler for DescribeTable {
    async fn call(
        &self,
        args: &ToolArguments,
        db: &dyn Database,
    ) -> Result<CallToolResult, McpError> {
        let Some(table) = args.str("table_name").filter(|t| !t.is_empty()) else {
            return Ok(CallToolResult::error(
                "Missing or invalid required argument: table_name",
            ));
        };

        let table = match validate_identifier("table name", table) {
            Ok(table) => table,
            Err(e) => return Ok(CallToolResult::error(e.to_string())),
        };

        match Self::describe(table, db).await {
            Ok(result) => Ok(result),
            Err(e) => Ok(CallToolResult::error(format!("Error describing table: {}", e))),
        }
    }
}

/// `execute_query`: read-only statements.
pub struct ExecuteQuery;

#[async_trait]
impl ToolHandler for ExecuteQuery {
    async fn call(
        &self,
        args: &ToolArguments,
        db: &dyn Database,
    ) -> Result<CallToolResult, McpError> {
        let query = required_str("execute_query", args, "query")?;

        if !StatementPolicy::READ.permits(query) {
            return Err(McpError::ForbiddenOperation {
                tool: "execute_query".to_string(),
                message: "Only SELECT queries are allowed via execute_query".to_string(),
            });
        }

        match db.query(query).await {
            Ok(out) => Ok(CallToolResult::json(&out.rows_json())),
            Err(e) => Ok(CallToolResult::error(format!("Error executing query: {}", e))),
        }
    }
}

/// `execute_update`: mutating and DDL statements.
pub struct ExecuteUpdate;

#[async_trait]
impl ToolHandler for ExecuteUpdate {
    async fn call(
        &self,
        args: &ToolArguments,
        db: &dyn Database,
    ) -> Result<CallToolResult, McpError> {
        let query = required_str("execute_update", args, "query")?;

        if !StatementPolicy::WRITE.permits(query) {
            return Err(McpError::ForbiddenOperation {
                tool: "execute_update".to_string(),
                message: "Only INSERT, UPDATE, DELETE, CREATE, or DROP queries are allowed via execute_update"
                    .to_string(),
            });
        }

        match db.execute(query).await {
            Ok(outcome) => Ok(CallToolResult::json(&serde_json::to_value(outcome)?)),
            Err(e) => Ok(CallToolResult::error(format!("Error executing update: {}", e))),
        }
    }
}
