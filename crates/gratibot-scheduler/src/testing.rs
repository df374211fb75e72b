//! In-memory store and notifier doubles shared by the scheduler tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use gratibot_core::error::{GratibotError, Result};
use gratibot_core::traits::{ReminderNotifier, ScheduleStore, UserStore};
use gratibot_core::types::{ReminderSchedule, User};

/// A cohort member: opted in to reminders, with an optional timezone.
pub(crate) fn user(user_id: i64, timezone: Option<&str>) -> User {
    let mut user = User::new(user_id, None, "Test", None);
    user.reminder_enabled = true;
    user.timezone = timezone.map(String::from);
    user
}

pub(crate) struct MemUsers {
    pub(crate) users: Mutex<Vec<User>>,
}

impl MemUsers {
    pub(crate) fn new(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
        }
    }
}

#[async_trait]
impl UserStore for MemUsers {
    async fn upsert_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(existing) = users.iter_mut().find(|u| u.user_id == user.user_id) {
            existing.username = user.username.clone();
            existing.first_name = user.first_name.clone();
            existing.last_name = user.last_name.clone();
        } else {
            users.push(user.clone());
        }
        Ok(())
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn set_reminder_enabled(&self, user_id: i64, enabled: bool) -> Result<bool> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.user_id == user_id) {
            Some(user) => {
                user.reminder_enabled = enabled;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_timezone(&self, user_id: i64, timezone: &str) -> Result<bool> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.user_id == user_id) {
            Some(user) => {
                user.timezone = Some(timezone.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn users_with_reminders_enabled(&self) -> Result<Vec<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().filter(|u| u.reminder_enabled).cloned().collect())
    }
}

#[derive(Default)]
pub(crate) struct MemSchedules {
    pub(crate) rows: Mutex<Vec<ReminderSchedule>>,
    /// Make `create_schedule` fail for this timezone.
    pub(crate) fail_for: Option<String>,
    pub(crate) creates: Mutex<u32>,
}

impl MemSchedules {
    pub(crate) fn create_calls(&self) -> u32 {
        *self.creates.lock().unwrap()
    }
}

#[async_trait]
impl ScheduleStore for MemSchedules {
    async fn create_schedule(&self, schedule: ReminderSchedule) -> Result<ReminderSchedule> {
        *self.creates.lock().unwrap() += 1;
        if self.fail_for.as_deref() == Some(schedule.timezone.as_str()) {
            return Err(GratibotError::Storage("disk full".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.iter().find(|r| r.id == schedule.id) {
            return Ok(existing.clone());
        }
        rows.push(schedule.clone());
        Ok(schedule)
    }

    async fn get_schedule(&self, id: &str) -> Result<Option<ReminderSchedule>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|r| r.id == id).cloned())
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

#[derive(Default)]
pub(crate) struct CountingNotifier {
    pub(crate) notified: Mutex<Vec<i64>>,
    /// Make `notify` fail for this user id.
    pub(crate) fail_for: Option<i64>,
}

impl CountingNotifier {
    pub(crate) fn notified_ids(&self) -> Vec<i64> {
        self.notified.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReminderNotifier for CountingNotifier {
    async fn notify(&self, user: &User) -> Result<()> {
        if self.fail_for == Some(user.user_id) {
            return Err(GratibotError::Channel("blocked by user".into()));
        }
        self.notified.lock().unwrap().push(user.user_id);
        Ok(())
    }
}
