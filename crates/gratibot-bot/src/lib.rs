//! # Gratibot Bot
//!
//! The conversation layer: routes incoming chat messages, captures
//! gratitude entries, and writes the daily reminder prompt.

pub mod keyboards;
pub mod prompter;
pub mod router;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use prompter::GratitudePrompter;
pub use router::BotRouter;
pub use session::{ChatMode, SessionRegistry};
