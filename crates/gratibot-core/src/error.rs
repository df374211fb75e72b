//! Error type shared across the Gratibot workspace.

use thiserror::Error;

/// Unified error for all Gratibot crates.
#[derive(Error, Debug)]
pub enum GratibotError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, GratibotError>;
