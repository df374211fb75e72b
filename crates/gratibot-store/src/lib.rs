//! # Gratibot Store
//!
//! SQLite-backed persistence behind the core store traits.

pub mod sqlite;

pub use sqlite::SqliteStore;
