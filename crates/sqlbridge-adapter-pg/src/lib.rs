//! Postgres implementation of the sqlbridge [`Database`] contract.

use async_trait::async_trait;
use sqlbridge_core::database::{Database, DatabaseError, ExecOutcome, FieldInfo, QueryOutput};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Column, Row, TypeInfo};

pub mod rows;

pub use rows::row_to_json;

/// Postgres database backed by a `sqlx` connection pool.
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    /// Connect a new pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn query(&self, sql: &str) -> Result<QueryOutput, DatabaseError> {
        tracing::debug!(sql, "Executing query");

        let rows = sqlx::query(sql)
            .persistent(false)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;

        let fields = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| FieldInfo {
                        name: col.name().to_string(),
                        type_name: col.type_info().name().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(QueryOutput {
            rows: rows.iter().map(row_to_json).collect(),
            fields,
        })
    }

    async fn execute(&self, sql: &str) -> Result<ExecOutcome, DatabaseError> {
        tracing::debug!(sql, "Executing statement");

        // Extended protocol: one statement per call, no trailing batch.
        let result = sqlx::query(sql)
            .persistent(false)
            .execute(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(ExecOutcome {
            rows_affected: result.rows_affected(),
        })
    }
}

fn query_error(err: sqlx::Error) -> DatabaseError {
    match err {
        sqlx::Error::Database(db) => DatabaseError::Query(db.message().to_string()),
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            DatabaseError::Connection(err.to_string())
        }
        other => DatabaseError::Query(other.to_string()),
    }
}
