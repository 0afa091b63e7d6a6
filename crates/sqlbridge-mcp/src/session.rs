//! Session registry for the SSE transport.
//!
//! A session is opened by a long-lived SSE connection and lives until that
//! connection goes away. Each session owns one worker task that drains its
//! inbound queue in order, so requests posted to the same session are answered
//! in submission order. Closing is idempotent: the worker, the HTTP layer and
//! shutdown may all race to close the same session.

use crate::error::McpError;
use async_trait::async_trait;
use sqlbridge_core::protocol::{JsonRpcRequest, JsonRpcResponse};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};

/// Handles one JSON-RPC request. `None` means no reply (notifications).
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse>;
}

/// An event pushed to a session's SSE stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

impl SseEvent {
    /// The first event of every session: where to POST requests.
    pub fn endpoint(session_id: &str) -> Self {
        Self {
            event: "endpoint".to_string(),
            data: format!("/message?sessionId={}", session_id),
        }
    }

    /// A JSON-RPC response.
    pub fn message(response: &JsonRpcResponse) -> Result<Self, McpError> {
        Ok(Self {
            event: "message".to_string(),
            data: serde_json::to_string(response)?,
        })
    }
}

struct SessionHandle {
    requests: mpsc::Sender<JsonRpcRequest>,
}

/// Live sessions, keyed by session id.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    handler: Arc<dyn RequestHandler>,
    buffer: usize,
}

impl SessionRegistry {
    /// Create a registry whose sessions dispatch to `handler`.
    ///
    /// `buffer` bounds both the inbound request queue and the outbound
    /// event queue of each session.
    pub fn new(handler: Arc<dyn RequestHandler>, buffer: usize) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            handler,
            buffer: buffer.max(1),
        })
    }

    /// Open a session and start its worker.
    ///
    /// Returns the new session id and the receiving end of its event stream.
    /// The endpoint event is already queued on the stream.
    pub async fn open(self: &Arc<Self>) -> (String, mpsc::Receiver<SseEvent>) {
        let id = uuid::Uuid::new_v4().to_string();
        let (request_tx, request_rx) = mpsc::channel(self.buffer);
        let (event_tx, event_rx) = mpsc::channel(self.buffer);

        // Fresh channel with capacity >= 1, so this cannot block.
        let _ = event_tx.send(SseEvent::endpoint(&id)).await;

        self.sessions.write().await.insert(
            id.clone(),
            SessionHandle {
                requests: request_tx,
            },
        );

        tokio::spawn(run_worker(self.clone(), id.clone(), request_rx, event_tx));

        tracing::info!(session_id = %id, "Session opened");
        (id, event_rx)
    }

    /// Queue a request on a session.
    pub async fn route(&self, session_id: &str, request: JsonRpcRequest) -> Result<(), McpError> {
        let sender = {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                Some(handle) => handle.requests.clone(),
                None => {
                    return Err(McpError::SessionNotFound {
                        id: session_id.to_string(),
                    });
                }
            }
        };

        sender
            .send(request)
            .await
            .map_err(|_| McpError::SessionNotFound {
                id: session_id.to_string(),
            })
    }

    /// Close a session. Returns `false` if it was already gone.
    pub async fn close(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            tracing::info!(session_id = %session_id, "Session closed");
        }
        removed
    }

    /// Close every session.
    pub async fn close_all(&self) {
        let drained: Vec<String> = self.sessions.write().await.drain().map(|(id, _)| id).collect();
        if !drained.is_empty() {
            tracing::info!(count = drained.len(), "Closed all sessions");
        }
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Drain one session's queue until the session is closed from either side.
async fn run_worker(
    registry: Arc<SessionRegistry>,
    session_id: String,
    mut requests: mpsc::Receiver<JsonRpcRequest>,
    events: mpsc::Sender<SseEvent>,
) {
    loop {
        tokio::select! {
            _ = events.closed() => {
                tracing::debug!(session_id = %session_id, "SSE stream dropped");
                break;
            }
            next = requests.recv() => {
                let Some(request) = next else { break };
                let method = request.method.clone();

                let Some(response) = registry.handler.handle(request).await else {
                    continue;
                };

                let event = match SseEvent::message(&response) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(session_id = %session_id, method = %method, error = %e, "Failed to serialize response");
                        continue;
                    }
                };

                if events.send(event).await.is_err() {
                    break;
                }
            }
        }
    }

    registry.close(&session_id).await;
}
