//! Message routing: the /start command, menu buttons, and free-form text.
//!
//! Buttons are matched by their exact label. Free-form text is interpreted
//! through the chat's [`ChatMode`]: a gratitude entry while capturing, a
//! menu hint otherwise.

use std::sync::Arc;

use chrono::Utc;
use gratibot_core::error::Result;
use gratibot_core::traits::{GratitudeStore, Messenger, ReminderNotifier, UserStore};
use gratibot_core::types::{GratitudeEntry, IncomingMessage, Keyboard, User};
use gratibot_scheduler::{ScheduleGenerator, TimezonePlanner};

use crate::keyboards;
use crate::session::{ChatMode, SessionRegistry};

/// Shortest accepted gratitude entry, in characters.
const MIN_GRATITUDE_LEN: usize = 3;

pub struct BotRouter {
    users: Arc<dyn UserStore>,
    gratitude: Arc<dyn GratitudeStore>,
    generator: Arc<ScheduleGenerator>,
    planner: Arc<dyn TimezonePlanner>,
    messenger: Arc<dyn Messenger>,
    sessions: Arc<SessionRegistry>,
    prompter: Arc<dyn ReminderNotifier>,
}

impl BotRouter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserStore>,
        gratitude: Arc<dyn GratitudeStore>,
        generator: Arc<ScheduleGenerator>,
        planner: Arc<dyn TimezonePlanner>,
        messenger: Arc<dyn Messenger>,
        sessions: Arc<SessionRegistry>,
        prompter: Arc<dyn ReminderNotifier>,
    ) -> Self {
        Self {
            users,
            gratitude,
            generator,
            planner,
            messenger,
            sessions,
            prompter,
        }
    }

    /// Handle one incoming message. A handler failure is logged and answered
    /// with an apology instead of taking down the update loop.
    pub async fn handle(&self, message: IncomingMessage) {
        if let Err(e) = self.route(&message).await {
            tracing::error!("Handler for chat {} failed: {e}", message.chat_id);
            let apology = "😔 Sorry, something went wrong. Please try again.";
            if let Err(e) = self
                .messenger
                .send_message(message.chat_id, apology, Some(&keyboards::main_menu()))
                .await
            {
                tracing::error!("Could not deliver apology to chat {}: {e}", message.chat_id);
            }
        }
    }

    async fn route(&self, message: &IncomingMessage) -> Result<()> {
        let text = message.text.trim();

        if text == "/start" {
            return self.handle_start(message).await;
        }

        match text {
            keyboards::BTN_SHOW_GRATITUDE => return self.start_gratitude_capture(message).await,
            keyboards::BTN_GO_BACK => return self.go_back(message).await,
            keyboards::BTN_SKIP => return self.skip_reminder(message).await,
            keyboards::BTN_REMINDER_SETTINGS => return self.show_reminder_settings(message).await,
            keyboards::BTN_ENABLE_REMINDERS => return self.set_reminders(message, true).await,
            keyboards::BTN_DISABLE_REMINDERS => return self.set_reminders(message, false).await,
            keyboards::BTN_CHANGE_TIMEZONE => return self.show_timezone_menu(message).await,
            keyboards::BTN_TODAY_TIME => return self.show_today_time(message).await,
            keyboards::BTN_SEND_NOW => return self.send_reminder_now(message).await,
            keyboards::BTN_STATISTICS => return self.show_statistics(message).await,
            keyboards::BTN_SETTINGS => return self.show_settings(message).await,
            _ => {}
        }

        if let Some(timezone) = keyboards::timezone_for_button(text) {
            return self.set_timezone(message, timezone).await;
        }

        match self.sessions.mode(message.chat_id) {
            ChatMode::AwaitingGratitude => self.capture_gratitude(message, text).await,
            ChatMode::Idle => self.menu_hint(message).await,
        }
    }

    /// Register, or refresh the identity of a returning user. Reminder and
    /// timezone preferences survive a repeat /start.
    async fn handle_start(&self, message: &IncomingMessage) -> Result<()> {
        let known = self.users.get_user(message.user_id).await?.is_some();
        let user = User::new(
            message.user_id,
            message.username.clone(),
            &message.first_name,
            message.last_name.clone(),
        );
        self.users.upsert_user(&user).await?;
        self.sessions.reset(message.chat_id);

        let text = if known {
            format!("👋 Welcome back, {}!", message.first_name)
        } else {
            tracing::info!("🆕 Registered user {}", message.user_id);
            format!(
                "🌱 Hi {}! I'm your gratitude journal.\n\n\
                 Once a day, at a random moment between 09:00 and 20:00, I can \
                 ask what you're grateful for. Turn reminders on under \
                 🔔 Reminder Settings, or use the menu below to get started.",
                message.first_name
            )
        };
        self.messenger
            .send_message(message.chat_id, &text, Some(&keyboards::main_menu()))
            .await
    }

    async fn start_gratitude_capture(&self, message: &IncomingMessage) -> Result<()> {
        self.sessions
            .set_mode(message.chat_id, ChatMode::AwaitingGratitude);
        self.messenger
            .send_message(
                message.chat_id,
                "What are you grateful for today? ✨",
                Some(&keyboards::gratitude_mode()),
            )
            .await
    }

    async fn go_back(&self, message: &IncomingMessage) -> Result<()> {
        self.sessions.reset(message.chat_id);
        self.messenger
            .send_message(message.chat_id, "What's next?", Some(&keyboards::main_menu()))
            .await
    }

    async fn skip_reminder(&self, message: &IncomingMessage) -> Result<()> {
        self.sessions.reset(message.chat_id);
        self.messenger
            .send_message(
                message.chat_id,
                "No worries, tomorrow is another day 🌿",
                Some(&keyboards::main_menu()),
            )
            .await
    }

    async fn capture_gratitude(&self, message: &IncomingMessage, text: &str) -> Result<()> {
        if text.chars().count() < MIN_GRATITUDE_LEN {
            return self
                .messenger
                .send_message(
                    message.chat_id,
                    "🤏 That's a bit short. Give it a few more words?",
                    Some(&keyboards::gratitude_mode()),
                )
                .await;
        }
        self.gratitude
            .create_entry(GratitudeEntry::new(message.user_id, text))
            .await?;
        self.sessions.reset(message.chat_id);
        self.messenger
            .send_message(
                message.chat_id,
                "✨ Saved! See you at tomorrow's reminder.",
                Some(&keyboards::main_menu()),
            )
            .await
    }

    async fn show_reminder_settings(&self, message: &IncomingMessage) -> Result<()> {
        let Some(user) = self.users.get_user(message.user_id).await? else {
            return self.ask_to_start(message).await;
        };
        let status = if user.reminder_enabled { "on" } else { "off" };
        let timezone = user
            .timezone
            .as_deref()
            .map(keyboards::timezone_display_name)
            .unwrap_or("UTC (default)");
        let text = format!("🔔 Daily reminders are *{status}*.\n🌍 Timezone: {timezone}");
        self.messenger
            .send_message(
                message.chat_id,
                &text,
                Some(&keyboards::reminder_settings(user.reminder_enabled)),
            )
            .await
    }

    async fn set_reminders(&self, message: &IncomingMessage, enabled: bool) -> Result<()> {
        if !self
            .users
            .set_reminder_enabled(message.user_id, enabled)
            .await?
        {
            return self.ask_to_start(message).await;
        }
        let text = if enabled {
            "🔔 Daily reminders are on. I'll pick a random moment between 09:00 and 20:00."
        } else {
            "🔕 Daily reminders are off. Your entries stay right here."
        };
        self.messenger
            .send_message(
                message.chat_id,
                text,
                Some(&keyboards::reminder_settings(enabled)),
            )
            .await
    }

    async fn show_timezone_menu(&self, message: &IncomingMessage) -> Result<()> {
        let Some(user) = self.users.get_user(message.user_id).await? else {
            return self.ask_to_start(message).await;
        };
        let current = user
            .timezone
            .as_deref()
            .map(keyboards::timezone_display_name)
            .unwrap_or("UTC (default)");
        let text =
            format!("🌍 Your timezone: {current}\n\nPick a new one so reminders match your day:");
        self.messenger
            .send_message(
                message.chat_id,
                &text,
                Some(&keyboards::timezone_selection()),
            )
            .await
    }

    async fn set_timezone(&self, message: &IncomingMessage, timezone: &str) -> Result<()> {
        if !self.planner.validate_timezone(Some(timezone)) {
            tracing::warn!("Rejected timezone {timezone} for user {}", message.user_id);
            return self
                .messenger
                .send_message(
                    message.chat_id,
                    "🤔 I don't know that timezone. Pick one from the menu below:",
                    Some(&keyboards::timezone_selection()),
                )
                .await;
        }
        if !self.users.set_timezone(message.user_id, timezone).await? {
            return self.ask_to_start(message).await;
        }
        let text = format!(
            "✅ Timezone set to *{}*. Reminders now follow it.",
            keyboards::timezone_display_name(timezone)
        );
        let keyboard = self.reminder_keyboard(message.user_id).await?;
        self.messenger
            .send_message(message.chat_id, &text, Some(&keyboard))
            .await
    }

    async fn show_today_time(&self, message: &IncomingMessage) -> Result<()> {
        let today = Utc::now().date_naive();
        let text = match self.generator.reminder_time_for(today).await? {
            Some(time) => format!(
                "🕐 Today's reminder is set for *{}* (your local time).",
                time.format("%H:%M")
            ),
            None => "🕐 No reminder is scheduled today. Enable reminders and it'll appear here."
                .to_string(),
        };
        let keyboard = self.reminder_keyboard(message.user_id).await?;
        self.messenger
            .send_message(message.chat_id, &text, Some(&keyboard))
            .await
    }

    async fn send_reminder_now(&self, message: &IncomingMessage) -> Result<()> {
        match self.users.get_user(message.user_id).await? {
            Some(user) => self.prompter.notify(&user).await,
            None => self.ask_to_start(message).await,
        }
    }

    async fn show_statistics(&self, message: &IncomingMessage) -> Result<()> {
        let entries = self.gratitude.recent_entries(message.user_id, 5).await?;
        let text = if entries.is_empty() {
            "📊 Nothing here yet. Tap \"📝 Show Gratitude\" and write your first entry!"
                .to_string()
        } else {
            let mut lines = vec!["📊 Your latest gratitude moments:".to_string(), String::new()];
            for entry in &entries {
                lines.push(format!(
                    "• {}: {}",
                    entry.created_at.format("%b %d"),
                    entry.content
                ));
            }
            lines.join("\n")
        };
        self.messenger
            .send_message(message.chat_id, &text, Some(&keyboards::main_menu()))
            .await
    }

    async fn show_settings(&self, message: &IncomingMessage) -> Result<()> {
        self.messenger
            .send_message(
                message.chat_id,
                "⚙️ Everything configurable lives under 🔔 Reminder Settings for now.",
                Some(&keyboards::main_menu()),
            )
            .await
    }

    async fn menu_hint(&self, message: &IncomingMessage) -> Result<()> {
        self.messenger
            .send_message(
                message.chat_id,
                "🤖 I didn't catch that. Use the menu below, or tap \"📝 Show Gratitude\" to write an entry.",
                Some(&keyboards::main_menu()),
            )
            .await
    }

    async fn ask_to_start(&self, message: &IncomingMessage) -> Result<()> {
        self.messenger
            .send_message(
                message.chat_id,
                "Please send /start first so I know who you are 🙂",
                None,
            )
            .await
    }

    async fn reminder_keyboard(&self, user_id: i64) -> Result<Keyboard> {
        // Unknown users have not opted in, so the keyboard offers Enable.
        let enabled = self
            .users
            .get_user(user_id)
            .await?
            .map(|u| u.reminder_enabled)
            .unwrap_or(false);
        Ok(keyboards::reminder_settings(enabled))
    }
}
