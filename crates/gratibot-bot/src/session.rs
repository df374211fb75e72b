//! Per-chat conversation state.
//!
//! In-memory only. A restart drops every chat back to the menu, which is
//! safe: the worst case is one free-form message landing as a menu hint
//! instead of a gratitude entry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// What the next free-form message in a chat means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatMode {
    /// Menu navigation; unknown text gets a hint.
    #[default]
    Idle,
    /// The next text message is saved as a gratitude entry.
    AwaitingGratitude,
}

/// Conversation mode for every active chat.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    modes: Mutex<HashMap<i64, ChatMode>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self, chat_id: i64) -> ChatMode {
        self.guard().get(&chat_id).copied().unwrap_or_default()
    }

    pub fn set_mode(&self, chat_id: i64, mode: ChatMode) {
        self.guard().insert(chat_id, mode);
    }

    /// Back to [`ChatMode::Idle`].
    pub fn reset(&self, chat_id: i64) {
        self.guard().remove(&chat_id);
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<i64, ChatMode>> {
        self.modes.lock().unwrap_or_else(|e| e.into_inner())
    }
}
