//! Observable data layers and the page context that owns them.
//!
//! A data layer is the append-only queue third-party tags push event
//! records into. Observation is a pure side channel: taps see every push
//! after it lands, and neither the pushed value nor `push`'s return value
//! is altered by having observers installed.

use crate::error::CaptureError;
use layerscope_protocol::RawValue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::Instant;

/// Observer invoked for every push: the appended value plus the pusher's
/// optional call-site trace.
pub type Tap = Arc<dyn Fn(&RawValue, Option<&str>) + Send + Sync>;

struct LayerInner {
    entries: Vec<RawValue>,
    taps: Vec<Tap>,
    sealed: bool,
}

/// One named, append-only event queue.
pub struct DataLayer {
    name: String,
    inner: Mutex<LayerInner>,
}

impl DataLayer {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(LayerInner {
                entries: Vec::new(),
                taps: Vec::new(),
                sealed: false,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a value; returns the new length, like the array `push` it
    /// stands in for.
    pub fn push(&self, value: RawValue) -> usize {
        self.push_traced(value, None)
    }

    pub fn push_traced(&self, value: RawValue, trace: Option<&str>) -> usize {
        let (length, taps) = {
            let mut inner = self.lock();
            inner.entries.push(value.clone());
            (inner.entries.len(), inner.taps.clone())
        };

        // Taps run outside the lock so an observer that pushes again
        // cannot deadlock the layer.
        for tap in &taps {
            tap(&value, trace);
        }
        length
    }

    /// Mark the layer as no longer observable. Pushes still land; only
    /// new observation is refused, modeling a frozen host array.
    pub fn seal(&self) {
        self.lock().sealed = true;
    }

    pub fn is_observable(&self) -> bool {
        !self.lock().sealed
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Atomically snapshot everything already pushed and install `tap`
    /// for every future push.
    pub fn observe(&self, tap: Tap) -> Result<Vec<RawValue>, CaptureError> {
        let mut inner = self.lock();
        if inner.sealed {
            return Err(CaptureError::SealedLayer {
                name: self.name.clone(),
            });
        }
        let snapshot = inner.entries.clone();
        inner.taps.push(tap);
        Ok(snapshot)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LayerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Per-page registry of layers plus the page-load origin used for entry
/// offsets.
pub struct PageContext {
    url: String,
    loaded_at: Instant,
    layers: Mutex<HashMap<String, Arc<DataLayer>>>,
}

impl PageContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            loaded_at: Instant::now(),
            layers: Mutex::new(HashMap::new()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Offset from the page-load origin; never negative by construction.
    pub fn elapsed_ms(&self) -> u64 {
        self.loaded_at.elapsed().as_millis() as u64
    }

    /// Make a layer visible on this page, creating it on first use.
    pub fn register(&self, name: &str) -> Arc<DataLayer> {
        let mut layers = self.layers.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            layers
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(DataLayer::new(name))),
        )
    }

    /// Detection probe: present only once the page has registered it.
    pub fn layer(&self, name: &str) -> Option<Arc<DataLayer>> {
        self.layers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}
