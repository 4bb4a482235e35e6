//! Timing constants shared across endpoints.

use std::time::Duration;

/// Quiet period before a burst of captured entries is flushed as one batch.
pub const FLUSH_DEBOUNCE: Duration = Duration::from_millis(256);

/// Cadence at which the capture agent probes for monitored layers.
pub const DETECT_INTERVAL: Duration = Duration::from_millis(256);

/// How long the capture agent waits for any monitored layer to appear.
pub const DETECT_TIMEOUT: Duration = Duration::from_millis(4096);

/// Default budget for one correlated bridge round-trip.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(4096);

/// Window during which an unresolved `Loading` state is withheld from the
/// badge sink, so fast-resolving pages never flash it.
pub const STATUS_GRACE: Duration = Duration::from_millis(250);

/// Cadence of the viewer's status polling loop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(512);

/// Overall budget after which the viewer treats the page as not found.
pub const POLL_BUDGET: Duration = Duration::from_secs(30);
