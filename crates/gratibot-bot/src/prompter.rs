//! The reminder prompt: message a user and get their chat ready to capture
//! the reply.

use std::sync::Arc;

use async_trait::async_trait;
use gratibot_core::error::Result;
use gratibot_core::traits::{Messenger, ReminderNotifier};
use gratibot_core::types::User;

use crate::keyboards;
use crate::session::{ChatMode, SessionRegistry};

pub struct GratitudePrompter {
    messenger: Arc<dyn Messenger>,
    sessions: Arc<SessionRegistry>,
}

impl GratitudePrompter {
    pub fn new(messenger: Arc<dyn Messenger>, sessions: Arc<SessionRegistry>) -> Self {
        Self {
            messenger,
            sessions,
        }
    }
}

pub(crate) fn reminder_text(first_name: &str) -> String {
    format!(
        "🌅 Hi {first_name}! Time for your daily gratitude moment.\n\n\
         What are you grateful for today? Just type it below ✨"
    )
}

#[async_trait]
impl ReminderNotifier for GratitudePrompter {
    async fn notify(&self, user: &User) -> Result<()> {
        // A reply typed straight after the prompt must already land in
        // capture mode.
        self.sessions
            .set_mode(user.user_id, ChatMode::AwaitingGratitude);
        self.messenger
            .send_message(
                user.user_id,
                &reminder_text(&user.first_name),
                Some(&keyboards::reminder_reply()),
            )
            .await
    }
}
