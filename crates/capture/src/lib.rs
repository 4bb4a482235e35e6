//! Page-side capture.
//!
//! A [`PageContext`] owns the monitored layers a page exposes; the
//! [`CaptureAgent`] waits for them to become observable, replays what is
//! already there, and taps every future push; the [`BatchRelay`] coalesces
//! the resulting stream into one batch per quiet period before it crosses
//! the sandbox boundary.

pub mod agent;
pub mod error;
pub mod layer;
pub mod relay;

pub use agent::{AgentConfig, CaptureAgent, DetectionReport};
pub use error::CaptureError;
pub use layer::{DataLayer, PageContext};
pub use relay::BatchRelay;
