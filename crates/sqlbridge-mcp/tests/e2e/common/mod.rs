//! Shared infrastructure for the Postgres end-to-end tests.
//!
//! - Docker container management for PostgreSQL
//! - A small seeded schema
//! - Result helpers

use serde_json::Value;
use sqlbridge_adapter_pg::PostgresDatabase;
use sqlbridge_core::protocol::CallToolResult;
use sqlbridge_mcp::ToolExecutor;
use sqlx::PgPool;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// DOCKER CONTAINER CONFIGURATION
// =============================================================================

pub const CONTAINER_NAME: &str = "sqlbridge_test_postgres";
pub const POSTGRES_PORT: u16 = 5434;
pub const POSTGRES_PASSWORD: &str = "sqlbridge_test_password";
pub const DATABASE_NAME: &str = "sqlbridge_test";

pub fn database_url() -> String {
    format!(
        "postgres://postgres:{}@localhost:{}/{}",
        POSTGRES_PASSWORD, POSTGRES_PORT, DATABASE_NAME
    )
}

/// Start a PostgreSQL container for testing
pub fn start_postgres_container() -> Result<(), String> {
    let _ = Command::new("docker")
        .args(["rm", "-f", CONTAINER_NAME])
        .output();

    let status = Command::new("docker")
        .args([
            "run",
            "-d",
            "--name",
            CONTAINER_NAME,
            "-e",
            &format!("POSTGRES_PASSWORD={}", POSTGRES_PASSWORD),
            "-e",
            &format!("POSTGRES_DB={}", DATABASE_NAME),
            "-p",
            &format!("{}:5432", POSTGRES_PORT),
            "postgres:16-alpine",
        ])
        .status()
        .map_err(|e| format!("Failed to start container: {}", e))?;

    if !status.success() {
        return Err("Failed to start PostgreSQL container".to_string());
    }

    Ok(())
}

/// Stop and remove the PostgreSQL container
pub fn stop_postgres_container() {
    let _ = Command::new("docker")
        .args(["rm", "-f", CONTAINER_NAME])
        .output();
}

/// Wait for PostgreSQL to be ready
pub async fn wait_for_postgres() -> Result<PgPool, String> {
    for attempt in 1..=60 {
        if let Ok(pool) = PgPool::connect(&database_url()).await {
            if sqlx::query("SELECT 1").fetch_one(&pool).await.is_ok() {
                println!("✅ PostgreSQL ready after {} attempts", attempt);
                return Ok(pool);
            }
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    Err("PostgreSQL did not become ready in time".to_string())
}

// =============================================================================
// DATABASE INITIALIZATION
// =============================================================================

const SCHEMA_SQL: &str = r#"
CREATE TABLE customers (
    customer_id SERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    email VARCHAR(255),
    lifetime_value NUMERIC(12, 2) NOT NULL DEFAULT 0,
    tags TEXT[] NOT NULL DEFAULT '{}',
    profile JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

INSERT INTO customers (name, email, lifetime_value, tags, profile) VALUES
    ('Ada Lovelace', 'ada@example.com', 15000, '{vip,early}', '{"tier": "gold"}'),
    ('Grace Hopper', NULL, 1199.88, '{}', NULL);

CREATE SCHEMA sales;

CREATE TABLE sales.orders (
    order_id SERIAL PRIMARY KEY,
    customer_id INTEGER NOT NULL REFERENCES customers (customer_id),
    total NUMERIC(10, 2) NOT NULL
);

CREATE TABLE empty_t ();

CREATE TYPE mood AS ENUM ('sad', 'ok', 'happy');
"#;

pub async fn initialize_database(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    println!("✅ Database initialized");
    Ok(())
}

// =============================================================================
// TEST CONTEXT
// =============================================================================

pub struct TestContext {
    pub pool: PgPool,
}

impl TestContext {
    pub async fn setup() -> Result<Self, String> {
        start_postgres_container()?;
        let pool = wait_for_postgres().await?;
        initialize_database(&pool)
            .await
            .map_err(|e| format!("Failed to initialize database: {}", e))?;
        Ok(Self { pool })
    }

    pub fn executor(&self) -> ToolExecutor {
        ToolExecutor::with_builtin_tools(Arc::new(PostgresDatabase::from_pool(self.pool.clone())))
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        stop_postgres_container();
        println!("🧹 Cleaned up PostgreSQL container");
    }
}

// =============================================================================
// RESULT HELPERS
// =============================================================================

/// Parse the first text part as JSON.
pub fn extract_json(result: &CallToolResult) -> Option<Value> {
    result.first_text().and_then(|text| serde_json::from_str(text).ok())
}

pub fn assert_success(result: &CallToolResult, msg: &str) {
    assert!(!result.is_error, "{}: {:?}", msg, result);
}

pub fn args(value: Value) -> serde_json::Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
