//! Bridge error types.

use layerscope_protocol::{Endpoint, EventKind};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("waiting for a response to \"{event}\" from {target} timed out after {timeout:?}")]
    Timeout {
        event: EventKind,
        target: Endpoint,
        timeout: Duration,
    },

    #[error("broadcast bus closed")]
    BusClosed,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
