//! Aggregator hub for one page lifetime.
//!
//! The hub is the single writer of captured history: it absorbs entry
//! batches from the page side, resolves the availability state machine,
//! maintains the bounded multi-page ring buffer, persists it through a
//! keyed store, and answers viewer queries. The badge service is the
//! privileged sink the hub pushes status digests at.

pub mod aggregator;
pub mod badge;
pub mod buffer;
pub mod error;
pub mod storage;

pub use aggregator::Aggregator;
pub use badge::{BadgeService, BadgeState};
pub use buffer::PageLog;
pub use error::{HubError, Result};
pub use storage::{JsonFileStore, KvStore, MemoryStore, PAGES_BUFFER_KEY, VIEWER_CONFIG_KEY};
