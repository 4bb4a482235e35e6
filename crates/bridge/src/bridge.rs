//! Correlated request/response on top of the broadcast bus.

use crate::bus::Bus;
use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use layerscope_protocol::{Endpoint, EventKind, Frame, timing::REQUEST_TIMEOUT};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout};
use tracing::warn;

pub type HandlerResult = std::result::Result<Option<Value>, Box<dyn std::error::Error + Send + Sync>>;

/// Responder callback for frames addressed at one endpoint.
///
/// Returning `Ok(None)` is the no-response sentinel: the requester is not
/// notified and its call runs into its own timeout. Errors are swallowed
/// and logged by the serve loop; they never tear it down.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, event: EventKind, data: Value) -> HandlerResult;
}

/// One endpoint's view of the bus.
///
/// Request ids come from a monotonic per-bridge counter; they only need to
/// be unique among this sender's concurrently outstanding requests.
pub struct Bridge {
    bus: Bus,
    endpoint: Endpoint,
    request_timeout: Duration,
    next_id: AtomicU64,
}

impl Bridge {
    pub fn new(bus: Bus, endpoint: Endpoint) -> Self {
        Self {
            bus,
            endpoint,
            request_timeout: REQUEST_TIMEOUT,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Send `data` at `target` and await the correlated response.
    ///
    /// Resolution requires the response to echo this request's id, come
    /// from `target`, and carry `handled = true`; concurrent requests may
    /// resolve in any order. The reply subscription is dropped on every
    /// return path, so neither success nor timeout leaks a listener.
    pub async fn request<T, R>(&self, target: Endpoint, event: EventKind, data: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = serde_json::to_value(data)?;

        // Subscribe before publishing so a responder on the same runtime
        // cannot reply into the void.
        let mut replies = self.bus.subscribe();
        self.bus
            .publish(Frame::request(id, self.endpoint, target, event, payload));

        let deadline = Instant::now() + self.request_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timed_out(event, target));
            }

            let frame = match timeout(remaining, replies.recv()).await {
                Err(_) => return Err(self.timed_out(event, target)),
                Ok(Err(RecvError::Closed)) => return Err(BridgeError::BusClosed),
                Ok(Err(RecvError::Lagged(skipped))) => {
                    warn!(endpoint = %self.endpoint, skipped, "reply listener lagged");
                    continue;
                }
                Ok(Ok(frame)) => frame,
            };

            if frame.handled && frame.id == id && frame.from == target {
                return Ok(serde_json::from_value(frame.data)?);
            }
        }
    }

    fn timed_out(&self, event: EventKind, target: Endpoint) -> BridgeError {
        BridgeError::Timeout {
            event,
            target,
            timeout: self.request_timeout,
        }
    }

    /// Spawn the responder loop for this endpoint.
    ///
    /// A failing handler drops that one request and keeps serving; it never
    /// propagates into the bridge or affects other requests.
    pub fn serve(&self, handler: Arc<dyn Handler>) -> ServiceHandle {
        let mut frames = self.bus.subscribe();
        let bus = self.bus.clone();
        let endpoint = self.endpoint;

        let task = tokio::spawn(async move {
            loop {
                let frame = match frames.recv().await {
                    Ok(frame) => frame,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(%endpoint, skipped, "responder lagged, frames dropped");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                if frame.to != endpoint || frame.handled {
                    continue;
                }

                match handler.handle(frame.event, frame.data.clone()).await {
                    Ok(Some(reply)) => bus.publish(frame.response(endpoint, reply)),
                    Ok(None) => {}
                    Err(error) => {
                        warn!(%endpoint, event = %frame.event, %error, "handler failed, request dropped");
                    }
                }
            }
        });

        ServiceHandle { task }
    }
}

/// Keeps a responder loop alive; aborts it on drop.
pub struct ServiceHandle {
    task: JoinHandle<()>,
}

impl ServiceHandle {
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::{Duration, sleep};

    struct Echo;

    #[async_trait]
    impl Handler for Echo {
        async fn handle(&self, _event: EventKind, data: Value) -> HandlerResult {
            Ok(Some(data))
        }
    }

    struct SlowEcho(Duration);

    #[async_trait]
    impl Handler for SlowEcho {
        async fn handle(&self, _event: EventKind, data: Value) -> HandlerResult {
            sleep(self.0).await;
            Ok(Some(data))
        }
    }

    struct FlakyOnStatus {
        failures: AtomicUsize,
    }

    #[async_trait]
    impl Handler for FlakyOnStatus {
        async fn handle(&self, event: EventKind, data: Value) -> HandlerResult {
            if event == EventKind::GetStatus {
                self.failures.fetch_add(1, Ordering::Relaxed);
                return Err("status backend unavailable".into());
            }
            Ok(Some(data))
        }
    }

    #[tokio::test]
    async fn round_trip_resolves_with_typed_payload() {
        let bus = Bus::default();
        let content = Bridge::new(bus.clone(), Endpoint::Content);
        let _service = content.serve(Arc::new(Echo));

        let viewer = Bridge::new(bus, Endpoint::Viewer);
        let reply: Value = viewer
            .request(Endpoint::Content, EventKind::GetStatus, &json!({"probe": 1}))
            .await
            .unwrap_or(Value::Null);

        assert_eq!(reply, json!({"probe": 1}));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_rejects_with_descriptive_error() {
        let bus = Bus::default();
        let viewer = Bridge::new(bus, Endpoint::Viewer).with_timeout(Duration::from_millis(50));

        let outcome: Result<Value> = viewer
            .request(Endpoint::Content, EventKind::GetStatus, &())
            .await;

        match outcome {
            Err(BridgeError::Timeout { event, target, .. }) => {
                assert_eq!(event, EventKind::GetStatus);
                assert_eq!(target, Endpoint::Content);
            }
            other => unreachable!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn listeners_are_released_on_both_outcomes() {
        let bus = Bus::default();
        let content = Bridge::new(bus.clone(), Endpoint::Content);
        let _service = content.serve(Arc::new(Echo));

        let viewer =
            Bridge::new(bus.clone(), Endpoint::Viewer).with_timeout(Duration::from_millis(50));
        let baseline = bus.receiver_count();

        for _ in 0..16 {
            let _reply: Result<Value> = viewer
                .request(Endpoint::Content, EventKind::GetStatus, &())
                .await;
        }
        assert_eq!(bus.receiver_count(), baseline);

        // No responder on Background: every call times out, and the
        // listener still comes down with the timer.
        for _ in 0..16 {
            let outcome: Result<Value> = viewer
                .request(Endpoint::Background, EventKind::SyncStatus, &())
                .await;
            assert!(outcome.is_err());
        }
        assert_eq!(bus.receiver_count(), baseline);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_requests_resolve_out_of_order() {
        let bus = Bus::default();

        let content = Bridge::new(bus.clone(), Endpoint::Content);
        let _slow = content.serve(Arc::new(SlowEcho(Duration::from_millis(200))));

        let background = Bridge::new(bus.clone(), Endpoint::Background);
        let _fast = background.serve(Arc::new(Echo));

        let viewer = Arc::new(Bridge::new(bus, Endpoint::Viewer));
        let slow_call = {
            let viewer = Arc::clone(&viewer);
            tokio::spawn(async move {
                viewer
                    .request::<_, Value>(Endpoint::Content, EventKind::GetStatus, &json!("slow"))
                    .await
            })
        };
        let fast_call = {
            let viewer = Arc::clone(&viewer);
            tokio::spawn(async move {
                viewer
                    .request::<_, Value>(Endpoint::Background, EventKind::SyncStatus, &json!("fast"))
                    .await
            })
        };

        let fast = fast_call.await.ok().and_then(Result::ok);
        let slow = slow_call.await.ok().and_then(Result::ok);

        assert_eq!(fast, Some(json!("fast")));
        assert_eq!(slow, Some(json!("slow")));
    }

    #[tokio::test(start_paused = true)]
    async fn failing_handler_does_not_break_later_requests() {
        let bus = Bus::default();
        let content = Bridge::new(bus.clone(), Endpoint::Content);
        let handler = Arc::new(FlakyOnStatus {
            failures: AtomicUsize::new(0),
        });
        let _service = content.serve(Arc::clone(&handler) as Arc<dyn Handler>);

        let viewer =
            Bridge::new(bus, Endpoint::Viewer).with_timeout(Duration::from_millis(50));

        let failed: Result<Value> = viewer
            .request(Endpoint::Content, EventKind::GetStatus, &())
            .await;
        assert!(failed.is_err());

        let ok: Result<Value> = viewer
            .request(Endpoint::Content, EventKind::LoadConfig, &json!("cfg"))
            .await;
        assert_eq!(ok.ok(), Some(json!("cfg")));
        assert_eq!(handler.failures.load(Ordering::Relaxed), 1);
    }
}
