//! Detection and interception of monitored layers.
//!
//! Tags create their queues at unpredictable times during page load, so
//! the agent probes for each configured name on a fixed cadence until a
//! deadline. The first observable layer resolves availability to "found";
//! a deadline with nothing observable resolves it to "not found". Either
//! way the page-side report is sent exactly once.

use crate::layer::{DataLayer, PageContext};
use crate::relay::BatchRelay;
use layerscope_bridge::Bridge;
use layerscope_protocol::timing::{DETECT_INTERVAL, DETECT_TIMEOUT};
use layerscope_protocol::{Endpoint, EventKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Layer names to monitor, e.g. `dataLayer`, `_mtm`.
    pub sources: Vec<String>,
    pub detect_interval: Duration,
    pub detect_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            sources: vec!["dataLayer".to_string()],
            detect_interval: DETECT_INTERVAL,
            detect_timeout: DETECT_TIMEOUT,
        }
    }
}

/// What detection ended up seeing before its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionReport {
    pub observed: Vec<String>,
    pub missing: Vec<String>,
}

pub struct CaptureAgent {
    ctx: Arc<PageContext>,
    bridge: Arc<Bridge>,
    relay: Arc<BatchRelay>,
    config: AgentConfig,
}

impl CaptureAgent {
    pub fn new(
        ctx: Arc<PageContext>,
        bridge: Arc<Bridge>,
        relay: Arc<BatchRelay>,
        config: AgentConfig,
    ) -> Self {
        Self {
            ctx,
            bridge,
            relay,
            config,
        }
    }

    /// Probe until every source is resolved or the deadline passes.
    ///
    /// "Found" is reported once, on the first observable layer; partial
    /// success counts as success, and the rest keep being probed until
    /// the deadline. "Not found" is reported once, only when nothing
    /// became observable at all.
    pub async fn run(&self) -> DetectionReport {
        let deadline = Instant::now() + self.config.detect_timeout;
        let mut remaining = self.config.sources.clone();
        let mut observed = Vec::new();
        let mut found_reported = false;

        loop {
            let mut still_missing = Vec::new();
            for name in remaining {
                match self.ctx.layer(&name) {
                    Some(layer) => match self.attach(&name, &layer) {
                        Ok(()) => observed.push(name),
                        Err(error) => info!(%error, "layer skipped"),
                    },
                    None => still_missing.push(name),
                }
            }
            remaining = still_missing;

            if !observed.is_empty() && !found_reported {
                found_reported = true;
                self.report(EventKind::EntryFound).await;
            }
            if remaining.is_empty() || Instant::now() >= deadline {
                break;
            }

            let nap = self
                .config
                .detect_interval
                .min(deadline.saturating_duration_since(Instant::now()));
            sleep(nap).await;
        }

        if observed.is_empty() {
            info!(
                timeout_ms = self.config.detect_timeout.as_millis() as u64,
                "no monitored layer appeared before the deadline"
            );
            self.report(EventKind::EntryNotFound).await;
        }

        DetectionReport {
            observed,
            missing: remaining,
        }
    }

    /// Replay what the layer already holds, then tap every future push.
    fn attach(&self, name: &str, layer: &Arc<DataLayer>) -> Result<(), crate::error::CaptureError> {
        let relay = Arc::clone(&self.relay);
        let source = name.to_string();
        let snapshot = layer.observe(Arc::new(move |value, trace| {
            relay.record(&source, value.clone(), trace.map(str::to_string));
        }))?;

        // Offsets for replayed entries are stamped now, at replay time.
        for value in snapshot {
            self.relay.record(name, value, None);
        }
        Ok(())
    }

    async fn report(&self, event: EventKind) {
        if let Err(error) = self
            .bridge
            .request::<_, bool>(Endpoint::Content, event, &())
            .await
        {
            warn!(%error, event = %event, "availability report failed");
        }
    }
}
