//! Batching relay: coalesces a burst of captured pushes into one
//! cross-boundary message per quiet period.
//!
//! Pushes can arrive in tight loops during page load; relaying each one
//! individually would degrade the host page. Recording is synchronous
//! fire-and-forget; the debounced flush serializes the whole pending list
//! and sends it once. A flush that times out drops its batch: capture is
//! at-most-once, best effort.

use layerscope_bridge::{Bridge, Debouncer};
use layerscope_protocol::{CapturedEntry, Endpoint, EventKind, RawValue, sanitize};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::layer::PageContext;

struct PendingEntry {
    id: Uuid,
    source_name: String,
    value: RawValue,
    trace_info: Option<String>,
    after_load_ms: u64,
}

type PendingBuffer = Arc<Mutex<Vec<PendingEntry>>>;

/// Buffers captured pushes and relays them as one `ENTRIES_BATCH` per
/// quiet period.
pub struct BatchRelay {
    ctx: Arc<PageContext>,
    pending: PendingBuffer,
    debouncer: Debouncer,
}

impl BatchRelay {
    pub fn new(ctx: Arc<PageContext>, bridge: Arc<Bridge>, window: Duration) -> Self {
        let pending: PendingBuffer = Arc::default();
        let buffer = Arc::clone(&pending);
        let debouncer = Debouncer::new(window, move || {
            let buffer = Arc::clone(&buffer);
            let bridge = Arc::clone(&bridge);
            async move { flush(&bridge, &buffer).await }
        });

        Self {
            ctx,
            pending,
            debouncer,
        }
    }

    /// Record one captured push. Synchronous and non-blocking, so it is
    /// safe to call from a layer tap in the middle of the host's push.
    pub fn record(&self, source_name: &str, value: RawValue, trace_info: Option<String>) {
        let entry = PendingEntry {
            id: Uuid::new_v4(),
            source_name: source_name.to_string(),
            value,
            trace_info,
            after_load_ms: self.ctx.elapsed_ms(),
        };
        lock_pending(&self.pending).push(entry);
        self.debouncer.poke();
    }

    /// Entries recorded but not yet flushed.
    pub fn pending_len(&self) -> usize {
        lock_pending(&self.pending).len()
    }
}

async fn flush(bridge: &Bridge, buffer: &PendingBuffer) {
    let batch: Vec<CapturedEntry> = lock_pending(buffer)
        .drain(..)
        .map(|entry| CapturedEntry {
            id: entry.id,
            source_name: entry.source_name,
            payload: sanitize(&entry.value),
            trace_info: entry.trace_info,
            after_load_ms: entry.after_load_ms,
        })
        .collect();
    if batch.is_empty() {
        return;
    }

    let count = batch.len();
    match bridge
        .request::<_, bool>(Endpoint::Content, EventKind::EntriesBatch, &batch)
        .await
    {
        Ok(_acked) => debug!(count, "relayed entries batch"),
        Err(error) => warn!(%error, count, "entries batch dropped"),
    }
}

fn lock_pending(buffer: &PendingBuffer) -> std::sync::MutexGuard<'_, Vec<PendingEntry>> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}
