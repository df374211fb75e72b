//! Trait seams between the bot, the scheduler, and their backing services.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::types::{GratitudeEntry, Keyboard, ReminderSchedule, User};

/// User persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert the user, or refresh identity fields if already registered.
    /// Preferences (timezone, reminder flag) survive re-registration.
    async fn upsert_user(&self, user: &User) -> Result<()>;

    async fn get_user(&self, user_id: i64) -> Result<Option<User>>;

    /// Returns false for an unknown user.
    async fn set_reminder_enabled(&self, user_id: i64, enabled: bool) -> Result<bool>;

    /// Returns false for an unknown user.
    async fn set_timezone(&self, user_id: i64, timezone: &str) -> Result<bool>;

    /// All users that currently want the daily reminder.
    async fn users_with_reminders_enabled(&self) -> Result<Vec<User>>;
}

/// Gratitude entry persistence.
#[async_trait]
pub trait GratitudeStore: Send + Sync {
    async fn create_entry(&self, entry: GratitudeEntry) -> Result<GratitudeEntry>;

    /// Most recent entries first.
    async fn recent_entries(&self, user_id: i64, limit: usize) -> Result<Vec<GratitudeEntry>>;
}

/// Reminder schedule persistence, keyed by [`ReminderSchedule::doc_id`].
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Create the schedule, or return the already-stored record for its id.
    async fn create_schedule(&self, schedule: ReminderSchedule) -> Result<ReminderSchedule>;

    async fn get_schedule(&self, id: &str) -> Result<Option<ReminderSchedule>>;

    async fn get_schedules_for_date(&self, date: NaiveDate) -> Result<Vec<ReminderSchedule>>;

    /// Flip `sent` and record the real send count. Returns false for an
    /// unknown id.
    async fn mark_as_sent(&self, id: &str, users_sent: u32) -> Result<bool>;
}

/// Outbound message transport.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()>;
}

/// Delivers a reminder prompt to one user and prepares the conversation to
/// capture their reply.
#[async_trait]
pub trait ReminderNotifier: Send + Sync {
    async fn notify(&self, user: &User) -> Result<()>;
}
