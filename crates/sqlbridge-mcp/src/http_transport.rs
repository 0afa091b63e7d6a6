//! HTTP/SSE transport for the MCP server.
//!
//! - `GET /sse` opens a session; its first event names the POST endpoint.
//! - `POST /message?sessionId=<id>` queues a JSON-RPC message on that
//!   session and answers `202 Accepted`; the reply arrives on the SSE stream.
//! - `GET /health` reports liveness.

use crate::error::McpError;
use crate::session::SessionRegistry;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response, Sse,
        sse::{Event, KeepAlive},
    },
    routing::{get, post},
};
use serde::Deserialize;
use sqlbridge_core::protocol::JsonRpcRequest;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// HTTP transport handler state.
#[derive(Clone)]
pub struct HttpTransportState {
    sessions: Arc<SessionRegistry>,
}

impl HttpTransportState {
    pub fn new(sessions: Arc<SessionRegistry>) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }
}

/// Query parameters for the message endpoint.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// Create the HTTP router for MCP.
pub fn create_router(state: HttpTransportState) -> Router {
    Router::new()
        .route("/sse", get(handle_sse))
        .route("/message", post(handle_message))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle `GET /sse`: open a session and stream its events.
async fn handle_sse(State(state): State<HttpTransportState>) -> impl IntoResponse {
    let (session_id, mut events) = state.sessions.open().await;
    tracing::debug!(session_id = %session_id, "SSE stream attached");

    let stream = async_stream::stream! {
        while let Some(event) = events.recv().await {
            yield Ok::<_, Infallible>(Event::default().event(event.event).data(event.data));
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

/// Handle `POST /message`: queue a JSON-RPC message on a session.
async fn handle_message(
    State(state): State<HttpTransportState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let Some(session_id) = query.session_id.filter(|id| !id.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing sessionId").into_response();
    };

    if !state.sessions.contains(&session_id).await {
        return (StatusCode::NOT_FOUND, "Session not found").into_response();
    }

    let request: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(session_id = %session_id, error = %e, "Rejected malformed message");
            return (StatusCode::BAD_REQUEST, format!("Invalid message: {}", e)).into_response();
        }
    };

    tracing::debug!(session_id = %session_id, method = %request.method, "Message received");

    match state.sessions.route(&session_id, request).await {
        Ok(()) => (StatusCode::ACCEPTED, "Accepted").into_response(),
        Err(McpError::SessionNotFound { .. }) => {
            (StatusCode::NOT_FOUND, "Session not found").into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Handle health check requests.
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "sqlbridge-mcp",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// HTTP server for the SSE transport.
pub struct HttpServer {
    listener: TcpListener,
    sessions: Arc<SessionRegistry>,
}

impl HttpServer {
    /// Bind the listener. Port `0` picks a free port.
    pub async fn bind(addr: &str, sessions: Arc<SessionRegistry>) -> Result<Self, McpError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| McpError::StartupFailed(format!("Failed to bind to {}: {}", addr, e)))?;
        Ok(Self { listener, sessions })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, McpError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` resolves, then close every session so open
    /// streams end and in-flight connections can drain.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), McpError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        let app = create_router(HttpTransportState::new(self.sessions.clone()));
        let sessions = self.sessions;

        tracing::info!(%addr, "MCP SSE server listening");

        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutting down, closing sessions");
                sessions.close_all().await;
            })
            .await
            .map_err(|e| McpError::TransportError(e.to_string()))?;

        Ok(())
    }
}
