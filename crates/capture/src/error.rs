//! Capture error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("layer \"{name}\" is sealed and cannot be observed")]
    SealedLayer { name: String },
}
