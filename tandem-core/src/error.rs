//! Error types for pipeline setup.
//!
//! Per-frame operations never return these: timeouts and import failures
//! surface as `None` plus a log line. `CoreError` is reserved for startup
//! paths where the caller must abort.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Surface pool must hold at least one surface")]
    EmptyPool,
    #[error("Failed to spawn render thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl CoreError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
