//! In-memory database used by unit tests.

use async_trait::async_trait;
use sqlbridge_core::database::{Database, DatabaseError, ExecOutcome, QueryOutput, Row};
use std::sync::Mutex;

/// Records every statement and answers with canned rows.
///
/// Responses registered with [`RecordingDatabase::respond_to`] win over the
/// default rows when their needle appears in the statement.
#[derive(Default)]
pub struct RecordingDatabase {
    statements: Mutex<Vec<String>>,
    rows: Vec<Row>,
    responses: Vec<(String, Vec<Row>)>,
    rows_affected: u64,
    failure: Option<String>,
}

impl RecordingDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn respond_to(mut self, needle: &str, rows: Vec<Row>) -> Self {
        self.responses.push((needle.to_string(), rows));
        self
    }

    pub fn with_rows_affected(mut self, n: u64) -> Self {
        self.rows_affected = n;
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    fn record(&self, sql: &str) -> Result<(), DatabaseError> {
        self.statements.lock().unwrap().push(sql.to_string());
        match &self.failure {
            Some(message) => Err(DatabaseError::Query(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Database for RecordingDatabase {
    async fn query(&self, sql: &str) -> Result<QueryOutput, DatabaseError> {
        self.record(sql)?;
        let rows = self
            .responses
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_else(|| self.rows.clone());
        Ok(QueryOutput {
            rows,
            fields: Vec::new(),
        })
    }

    async fn execute(&self, sql: &str) -> Result<ExecOutcome, DatabaseError> {
        self.record(sql)?;
        Ok(ExecOutcome {
            rows_affected: self.rows_affected,
        })
    }
}
