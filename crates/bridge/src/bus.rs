//! Thin wrapper over the host-provided broadcast primitive.
//!
//! Every endpoint sees every frame; addressing and correlation live in the
//! envelope, not the transport. A frame published while nobody listens is
//! simply lost, matching broadcast-channel semantics.

use layerscope_protocol::Frame;
use tokio::sync::broadcast;
use tracing::trace;

pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// Shared broadcast bus connecting all endpoints of one page.
#[derive(Clone)]
pub struct Bus {
    frames: broadcast::Sender<Frame>,
}

impl Bus {
    pub fn new(capacity: usize) -> Self {
        let (frames, _) = broadcast::channel(capacity);
        Self { frames }
    }

    pub fn publish(&self, frame: Frame) {
        if self.frames.send(frame).is_err() {
            trace!("frame published with no listeners");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.frames.subscribe()
    }

    /// Number of live listeners. Exposed so tests can prove that request
    /// listeners are torn down on both the response and the timeout path.
    pub fn receiver_count(&self) -> usize {
        self.frames.receiver_count()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}
