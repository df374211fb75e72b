//! Shared data model: users, gratitude entries, reminder schedules,
//! and the channel-facing message types.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered bot user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Telegram user id. Doubles as the private chat id for reminders.
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    /// IANA timezone name. `None` means the user never picked one and
    /// belongs to the UTC cohort.
    pub timezone: Option<String>,
    pub reminder_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A fresh registration: reminders off until the user opts in, no
    /// timezone yet.
    pub fn new(
        user_id: i64,
        username: Option<String>,
        first_name: &str,
        last_name: Option<String>,
    ) -> Self {
        Self {
            user_id,
            username,
            first_name: first_name.to_string(),
            last_name,
            timezone: None,
            reminder_enabled: false,
            created_at: Utc::now(),
        }
    }
}

/// One saved gratitude note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GratitudeEntry {
    pub id: String,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl GratitudeEntry {
    pub fn new(user_id: i64, content: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// One reminder schedule: a single date and timezone cohort.
///
/// Records are append-only; `sent` flips to true exactly once, after the
/// dispatch batch for the cohort ran. `users_count` is the cohort size at
/// generation time and `users_sent` the successful sends at dispatch time;
/// the two may differ because the cohort is re-read when the timer fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderSchedule {
    /// Composite id, see [`ReminderSchedule::doc_id`].
    pub id: String,
    pub date: NaiveDate,
    /// IANA cohort timezone; literal "UTC" for users without one.
    pub timezone: String,
    /// Shared wall-clock reminder time for `date`, same across cohorts.
    pub local_time: NaiveTime,
    /// The dispatch instant, converted to UTC and stored naive.
    pub utc_time: NaiveDateTime,
    pub sent: bool,
    pub users_count: u32,
    pub users_sent: u32,
    pub created_at: DateTime<Utc>,
}

impl ReminderSchedule {
    pub fn new(
        date: NaiveDate,
        timezone: &str,
        local_time: NaiveTime,
        utc_time: NaiveDateTime,
        users_count: u32,
    ) -> Self {
        Self {
            id: Self::doc_id(date, timezone),
            date,
            timezone: timezone.to_string(),
            local_time,
            utc_time,
            sent: false,
            users_count,
            users_sent: 0,
            created_at: Utc::now(),
        }
    }

    /// Document id for a date + timezone pair, e.g. `2024-06-15_Europe_London`.
    pub fn doc_id(date: NaiveDate, timezone: &str) -> String {
        format!("{}_{}", date.format("%Y-%m-%d"), timezone.replace('/', "_"))
    }
}

/// A text message received from the chat channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Chat to reply into.
    pub chat_id: i64,
    /// Sender's user id.
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// A reply keyboard: rows of button labels shown under the input field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<String>>,
}

impl Keyboard {
    pub fn new(rows: Vec<Vec<&str>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(String::from).collect())
                .collect(),
        }
    }
}
