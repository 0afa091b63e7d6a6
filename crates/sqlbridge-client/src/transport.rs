//! SSE client transport.
//!
//! Opens `<base>/sse`, waits for the `endpoint` event, then POSTs JSON-RPC
//! messages to that endpoint. Replies arrive as `message` events on the
//! stream and are matched to callers by request id.

use crate::error::ClientError;
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures::{Stream, StreamExt};
use serde_json::Value;
use sqlbridge_core::protocol::{JsonRpcRequest, JsonRpcResponse};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const ENDPOINT_TIMEOUT: Duration = Duration::from_secs(10);

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

type EventStream =
    Pin<Box<dyn Stream<Item = Result<Event, EventStreamError<reqwest::Error>>> + Send>>;

/// A connected SSE session.
pub struct SseTransport {
    http: reqwest::Client,
    endpoint: Url,
    pending: Pending,
    next_id: AtomicU64,
    closed: Arc<AtomicBool>,
    timeout: Duration,
    reader: JoinHandle<()>,
}

impl SseTransport {
    /// Open a session against a server base URL such as `http://localhost:3001`.
    pub async fn connect(base_url: &str) -> Result<Self, ClientError> {
        let sse_url = Url::parse(&format!("{}/sse", base_url.trim_end_matches('/')))?;
        let http = reqwest::Client::new();

        let response = http
            .get(sse_url.clone())
            .header("Accept", "text/event-stream")
            .send()
            .await?
            .error_for_status()?;

        let mut events: EventStream = Box::pin(response.bytes_stream().eventsource());

        let endpoint = tokio::time::timeout(ENDPOINT_TIMEOUT, wait_for_endpoint(&mut events, &sse_url))
            .await
            .map_err(|_| ClientError::Timeout("endpoint event".to_string()))??;

        tracing::debug!(endpoint = %endpoint, "SSE session established");

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        let reader = {
            let pending = pending.clone();
            let closed = closed.clone();
            tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    let event = match event {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!(error = %e, "SSE stream error");
                            break;
                        }
                    };
                    if event.event != "message" {
                        continue;
                    }
                    dispatch(&pending, &event.data).await;
                }

                close_pending(&pending, &closed).await;
                tracing::debug!("SSE stream ended");
            })
        };

        Ok(Self {
            http,
            endpoint,
            pending,
            next_id: AtomicU64::new(1),
            closed,
            timeout: DEFAULT_TIMEOUT,
            reader,
        })
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The POST endpoint announced by the server.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Send a request and wait for its response.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        register(&self.pending, &self.closed, id, tx).await?;

        let request = JsonRpcRequest::new(id, method, params);
        if let Err(e) = self.post(&request).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(ClientError::Closed),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                return Err(ClientError::Timeout(method.to_string()));
            }
        };

        if let Some(error) = response.error {
            return Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Send a notification; no response is expected.
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), ClientError> {
        self.post(&JsonRpcRequest::notification(method, params)).await
    }

    async fn post(&self, request: &JsonRpcRequest) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

impl Drop for SseTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Skip events until the server announces where to POST.
async fn wait_for_endpoint(events: &mut EventStream, sse_url: &Url) -> Result<Url, ClientError> {
    while let Some(event) = events.next().await {
        let event = event.map_err(|e| ClientError::Stream(e.to_string()))?;
        if event.event == "endpoint" {
            return Ok(sse_url.join(event.data.trim())?);
        }
    }
    Err(ClientError::Closed)
}

/// Add a waiter unless the stream has already ended. The closed flag is
/// read under the same lock [`close_pending`] takes.
async fn register(
    pending: &Pending,
    closed: &AtomicBool,
    id: u64,
    waiter: oneshot::Sender<JsonRpcResponse>,
) -> Result<(), ClientError> {
    let mut waiters = pending.lock().await;
    if closed.load(Ordering::SeqCst) {
        return Err(ClientError::Closed);
    }
    waiters.insert(id, waiter);
    Ok(())
}

/// Mark the session closed and drop every waiter, which wakes them with
/// `Closed`.
async fn close_pending(pending: &Pending, closed: &AtomicBool) {
    let mut waiters = pending.lock().await;
    closed.store(true, Ordering::SeqCst);
    waiters.clear();
}

async fn dispatch(pending: &Pending, data: &str) {
    let response: JsonRpcResponse = match serde_json::from_str(data) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring undecodable message event");
            return;
        }
    };

    let Some(id) = response.id.as_ref().and_then(Value::as_u64) else {
        tracing::debug!("Ignoring message without a numeric id");
        return;
    };

    match pending.lock().await.remove(&id) {
        Some(waiter) => {
            let _ = waiter.send(response);
        }
        None => tracing::debug!(id, "No caller waiting for response"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_dispatch_matches_by_id() {
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let (tx1, rx1) = oneshot::channel();
        let (tx2, mut rx2) = oneshot::channel();
        pending.lock().await.insert(1, tx1);
        pending.lock().await.insert(2, tx2);

        let data = serde_json::to_string(&JsonRpcResponse::success(Some(json!(1)), json!("one")))
            .unwrap();
        dispatch(&pending, &data).await;

        assert_eq!(rx1.await.unwrap().result, Some(json!("one")));
        assert!(rx2.try_recv().is_err());
        assert_eq!(pending.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_register_after_close_is_refused() {
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let closed = AtomicBool::new(false);

        let (tx, rx) = oneshot::channel();
        register(&pending, &closed, 1, tx).await.unwrap();
        close_pending(&pending, &closed).await;
        assert!(rx.await.is_err());

        let (tx, _rx) = oneshot::channel();
        let err = register(&pending, &closed, 2, tx).await.unwrap_err();
        assert!(matches!(err, ClientError::Closed));
        assert!(pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_close_waits_for_in_flight_registration() {
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        // Hold the lock as a registering caller would, then close concurrently.
        let guard = pending.lock().await;
        let closer = {
            let pending = pending.clone();
            let closed = closed.clone();
            tokio::spawn(async move { close_pending(&pending, &closed).await })
        };
        tokio::task::yield_now().await;
        assert!(!closed.load(Ordering::SeqCst));
        drop(guard);

        closer.await.unwrap();
        assert!(closed.load(Ordering::SeqCst));
        let (tx, _rx) = oneshot::channel();
        assert!(register(&pending, &closed, 3, tx).await.is_err());
    }

    #[tokio::test]
    async fn test_dispatch_ignores_garbage_and_unknown_ids() {
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let (tx, _rx) = oneshot::channel();
        pending.lock().await.insert(5, tx);

        dispatch(&pending, "not json").await;
        let other = serde_json::to_string(&JsonRpcResponse::success(Some(json!(9)), json!(null)))
            .unwrap();
        dispatch(&pending, &other).await;

        assert!(pending.lock().await.contains_key(&5));
    }
}
