//! Wire contracts shared by all layerscope endpoints.
//!
//! This crate intentionally exposes a small surface:
//! - the typed frame envelope carried over the broadcast bus
//! - the captured-entry / page-record / pages-buffer data model
//! - the dynamic value model pushed into monitored layers, and its
//!   lossy sanitizer
//! - viewer configuration and the shared timing constants

pub mod config;
pub mod envelope;
pub mod model;
pub mod sanitize;
pub mod timing;
pub mod value;

pub use config::{Config, FormatMode, ThemeMode};
pub use envelope::{Endpoint, EventKind, Frame};
pub use model::{
    Availability, CapturedEntry, PageRecord, PagesBuffer, PagesQuery, StatusReply, StatusSync,
};
pub use sanitize::{CIRCULAR_MARKER, sanitize};
pub use value::RawValue;
