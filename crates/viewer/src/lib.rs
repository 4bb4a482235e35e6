//! Viewer query layer.
//!
//! The viewer never touches captured data directly: it polls the hub for
//! availability, pulls the buffered pages view, and materializes entries
//! into presentation cards exactly once. Filtering and expand/collapse are
//! purely local; configuration changes flow back through the hub's store.

pub mod client;
pub mod filter;
pub mod format;
pub mod naming;
pub mod panel;
pub mod poll;

pub use client::{ConfigSync, ViewerClient};
pub use filter::is_matching;
pub use format::format_duration_ms;
pub use naming::event_name;
pub use panel::{EntryCard, Panel};
pub use poll::{poll_status, poll_status_default};
