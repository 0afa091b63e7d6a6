//! Backing-resource contract.
//!
//! Tool handlers talk to the database only through [`Database`]. Adapters
//! normalize driver rows into plain JSON objects before returning them, so
//! nothing driver-specific reaches a tool result.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// One result row as column name → value.
pub type Row = Map<String, Value>;

/// Column metadata for a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Rows and fields returned by a row-producing statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub rows: Vec<Row>,
    pub fields: Vec<FieldInfo>,
}

impl QueryOutput {
    /// The rows as a JSON array.
    pub fn rows_json(&self) -> Value {
        Value::Array(self.rows.iter().cloned().map(Value::Object).collect())
    }
}

/// Outcome of a mutating statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutcome {
    #[serde(rename = "rowsAffected")]
    pub rows_affected: u64,
}

/// Errors raised by the backing resource.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The statement was rejected or failed while running.
    #[error("{0}")]
    Query(String),

    /// No connection could be obtained.
    #[error("connection failed: {0}")]
    Connection(String),
}

#[async_trait]
pub trait Database: Send + Sync {
    /// Run a row-producing statement.
    async fn query(&self, sql: &str) -> Result<QueryOutput, DatabaseError>;

    /// Run a mutating or DDL statement.
    async fn execute(&self, sql: &str) -> Result<ExecOutcome, DatabaseError>;
}
