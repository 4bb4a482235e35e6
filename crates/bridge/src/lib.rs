//! Cross-endpoint plumbing: the broadcast bus wrapper, the correlated
//! request/response bridge built on top of it, and the debouncer used to
//! coalesce bursts on both sides of the boundary.

pub mod bridge;
pub mod bus;
pub mod debounce;
pub mod error;

pub use bridge::{Bridge, Handler, HandlerResult, ServiceHandle};
pub use bus::{Bus, DEFAULT_BUS_CAPACITY};
pub use debounce::Debouncer;
pub use error::{BridgeError, Result};
