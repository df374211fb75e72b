//! Doubles and a wired-up fixture for router and prompter tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use gratibot_core::error::{GratibotError, Result};
use gratibot_core::traits::{GratitudeStore, Messenger, ScheduleStore, UserStore};
use gratibot_core::types::{GratitudeEntry, IncomingMessage, Keyboard, ReminderSchedule, User};
use gratibot_core::ReminderMode;
use gratibot_scheduler::{ScheduleGenerator, TzDatabasePlanner};

use crate::prompter::GratitudePrompter;
use crate::router::BotRouter;
use crate::session::SessionRegistry;

#[derive(Default)]
pub(crate) struct RecordingMessenger {
    pub(crate) sent: Mutex<Vec<(i64, String, Option<Keyboard>)>>,
    pub(crate) fail: bool,
}

impl RecordingMessenger {
    pub(crate) fn messages(&self) -> Vec<(i64, String, Option<Keyboard>)> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn last_text(&self) -> String {
        self.sent
            .lock()
            .unwrap()
            .last()
            .map(|(_, text, _)| text.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        if self.fail {
            return Err(GratibotError::Channel("network down".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_id, text.to_string(), keyboard.cloned()));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemUsers {
    users: Mutex<HashMap<i64, User>>,
}

#[async_trait]
impl UserStore for MemUsers {
    async fn upsert_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        users
            .entry(user.user_id)
            .and_modify(|existing| {
                existing.username = user.username.clone();
                existing.first_name = user.first_name.clone();
                existing.last_name = user.last_name.clone();
            })
            .or_insert_with(|| user.clone());
        Ok(())
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }

    async fn set_reminder_enabled(&self, user_id: i64, enabled: bool) -> Result<bool> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&user_id) {
            Some(user) => {
                user.reminder_enabled = enabled;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_timezone(&self, user_id: i64, timezone: &str) -> Result<bool> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&user_id) {
            Some(user) => {
                user.timezone = Some(timezone.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn users_with_reminders_enabled(&self) -> Result<Vec<User>> {
        let users = self.users.lock().unwrap();
        let mut enabled: Vec<User> = users
            .values()
            .filter(|u| u.reminder_enabled)
            .cloned()
            .collect();
        enabled.sort_by_key(|u| u.user_id);
        Ok(enabled)
    }
}

#[derive(Default)]
pub(crate) struct MemGratitude {
    entries: Mutex<Vec<GratitudeEntry>>,
    fail: AtomicBool,
}

impl MemGratitude {
    pub(crate) fn all(&self) -> Vec<GratitudeEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub(crate) fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl GratitudeStore for MemGratitude {
    async fn create_entry(&self, entry: GratitudeEntry) -> Result<GratitudeEntry> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(GratibotError::Storage("disk full".into()));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn recent_entries(&self, user_id: i64, limit: usize) -> Result<Vec<GratitudeEntry>> {
        let entries = self.entries.lock().unwrap();
        let mut matching: Vec<GratitudeEntry> = entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }
}

#[derive(Default)]
pub(crate) struct MemSchedules {
    rows: Mutex<Vec<ReminderSchedule>>,
}

#[async_trait]
impl ScheduleStore for MemSchedules {
    async fn create_schedule(&self, schedule: ReminderSchedule) -> Result<ReminderSchedule> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.iter().find(|r| r.id == schedule.id) {
            return Ok(existing.clone());
        }
        rows.push(schedule.clone());
        Ok(schedule)
    }

    async fn get_schedule(&self, id: &str) -> Result<Option<ReminderSchedule>> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn get_schedules_for_date(&self, date: NaiveDate) -> Result<Vec<ReminderSchedule>> {
        let rows = self.rows.lock().unwrap();
        let mut matching: Vec<ReminderSchedule> =
            rows.iter().filter(|r| r.date == date).cloned().collect();
        matching.sort_by(|a, b| a.timezone.cmp(&b.timezone));
        Ok(matching)
    }

    async fn mark_as_sent(&self, id: &str, users_sent: u32) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                row.sent = true;
                row.users_sent = users_sent;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

pub(crate) struct TestBot {
    pub(crate) router: BotRouter,
    pub(crate) users: Arc<MemUsers>,
    pub(crate) gratitude: Arc<MemGratitude>,
    pub(crate) messenger: Arc<RecordingMessenger>,
    pub(crate) sessions: Arc<SessionRegistry>,
}

pub(crate) fn test_bot() -> TestBot {
    test_bot_with(RecordingMessenger::default())
}

pub(crate) fn test_bot_with(messenger: RecordingMessenger) -> TestBot {
    let users = Arc::new(MemUsers::default());
    let gratitude = Arc::new(MemGratitude::default());
    let schedules = Arc::new(MemSchedules::default());
    let messenger = Arc::new(messenger);
    let sessions = Arc::new(SessionRegistry::new());
    let planner = Arc::new(TzDatabasePlanner);
    let generator = Arc::new(ScheduleGenerator::new(
        users.clone(),
        schedules,
        planner.clone(),
        ReminderMode::PerTimezone,
    ));
    let prompter = Arc::new(GratitudePrompter::new(messenger.clone(), sessions.clone()));
    let router = BotRouter::new(
        users.clone(),
        gratitude.clone(),
        generator,
        planner,
        messenger.clone(),
        sessions.clone(),
        prompter,
    );
    TestBot {
        router,
        users,
        gratitude,
        messenger,
        sessions,
    }
}

pub(crate) fn msg(user_id: i64, text: &str) -> IncomingMessage {
    IncomingMessage {
        chat_id: user_id,
        user_id,
        username: None,
        first_name: "Taylor".to_string(),
        last_name: None,
        text: text.to_string(),
        timestamp: Utc::now(),
    }
}
