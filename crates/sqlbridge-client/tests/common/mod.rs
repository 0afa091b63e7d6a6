//! Shared helpers: an in-process sqlbridge server over a canned database.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use sqlbridge_core::config::ServerConfig;
use sqlbridge_core::database::{Database, DatabaseError, ExecOutcome, QueryOutput, Row};
use sqlbridge_mcp::{HttpServer, McpServer, SessionRegistry, ToolExecutor};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Answers every query with the same rows.
#[derive(Default)]
pub struct CannedDatabase {
    pub rows: Vec<Row>,
    pub statements: Mutex<Vec<String>>,
}

impl CannedDatabase {
    pub fn with_users() -> Self {
        let row = |v: Value| -> Row { v.as_object().cloned().unwrap_or_default() };
        Self {
            rows: vec![
                row(json!({ "id": 1, "name": "Ada" })),
                row(json!({ "id": 2, "name": "Grace" })),
            ],
            statements: Mutex::new(Vec::new()),
        }
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl Database for CannedDatabase {
    async fn query(&self, sql: &str) -> Result<QueryOutput, DatabaseError> {
        self.statements.lock().unwrap().push(sql.to_string());
        Ok(QueryOutput {
            rows: self.rows.clone(),
            fields: Vec::new(),
        })
    }

    async fn execute(&self, sql: &str) -> Result<ExecOutcome, DatabaseError> {
        self.statements.lock().unwrap().push(sql.to_string());
        Ok(ExecOutcome { rows_affected: 1 })
    }
}

/// A running server on an ephemeral port.
pub struct TestServer {
    pub base_url: String,
    pub addr: SocketAddr,
    pub db: Arc<CannedDatabase>,
    pub sessions: Arc<SessionRegistry>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let db = Arc::new(CannedDatabase::with_users());
        let server = Arc::new(McpServer::new(
            ServerConfig::default(),
            ToolExecutor::with_builtin_tools(db.clone()),
        ));
        let sessions = SessionRegistry::new(server, 16);
        let http = HttpServer::bind("127.0.0.1:0", sessions.clone()).await.unwrap();
        let addr = http.local_addr().unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            http.serve(async move {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            addr,
            db,
            sessions,
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
    }
}

pub fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
