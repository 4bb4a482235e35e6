//! Poke-to-reset debouncer.
//!
//! Bursts on the capture side (tight push loops) and on the hub side
//! (persist + badge sync) are coalesced the same way: every poke restarts
//! the quiet window, and the action runs once when a window finally
//! elapses untouched.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};

/// Runs `action` once per quiet period following one or more pokes.
///
/// Dropping the debouncer stops its task; a pending, not-yet-elapsed
/// window is abandoned without running the action.
pub struct Debouncer {
    pokes: mpsc::UnboundedSender<()>,
}

impl Debouncer {
    pub fn new<F, Fut>(window: Duration, mut action: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (pokes, mut poked) = mpsc::unbounded_channel::<()>();

        tokio::spawn(async move {
            let timer = sleep(window);
            tokio::pin!(timer);
            let mut armed = false;

            loop {
                tokio::select! {
                    poke = poked.recv() => match poke {
                        Some(()) => {
                            timer.as_mut().reset(Instant::now() + window);
                            armed = true;
                        }
                        None => break,
                    },
                    () = timer.as_mut(), if armed => {
                        armed = false;
                        action().await;
                    }
                }
            }
        });

        Self { pokes }
    }

    /// Restart the quiet window. Never blocks; safe from sync code.
    pub fn poke(&self) {
        let _ = self.pokes.send(());
    }
}
