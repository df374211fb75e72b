//! # Gratibot Core
//!
//! Shared foundation for the Gratibot workspace: configuration, the error
//! type, the data model, and the trait seams the other crates plug into.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{GratibotConfig, ReminderMode};
pub use error::{GratibotError, Result};
