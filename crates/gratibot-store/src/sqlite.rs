//! SQLite persistence: users, gratitude entries, reminder schedules.
//!
//! One database file, one connection behind a mutex. Queries are short
//! synchronous statements; dates and times are stored as ISO text.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use gratibot_core::error::{GratibotError, Result};
use gratibot_core::traits::{GratitudeStore, ScheduleStore, UserStore};
use gratibot_core::types::{GratitudeEntry, ReminderSchedule, User};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";
const DATETIME_FMT: &str = "%Y-%m-%dT%H:%M:%S";

/// All three Gratibot stores on one sqlite file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (and migrate) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| GratibotError::Storage(format!("DB open: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                username TEXT,
                first_name TEXT NOT NULL,
                last_name TEXT,
                timezone TEXT,
                reminder_enabled INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS gratitude_entries (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_entries_user
                ON gratitude_entries(user_id, created_at);

            CREATE TABLE IF NOT EXISTS reminder_schedules (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                timezone TEXT NOT NULL,
                local_time TEXT NOT NULL,
                utc_time TEXT NOT NULL,
                sent INTEGER NOT NULL DEFAULT 0,
                users_count INTEGER NOT NULL DEFAULT 0,
                users_sent INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_schedules_date
                ON reminder_schedules(date);
            ",
        )
        .map_err(|e| GratibotError::Storage(format!("Migration: {e}")))?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| GratibotError::Storage(e.to_string()))
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        user_id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        timezone: row.get(4)?,
        reminder_enabled: row.get::<_, i32>(5)? != 0,
        created_at: parse_datetime_utc(&row.get::<_, String>(6)?),
    })
}

fn row_to_schedule(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReminderSchedule> {
    Ok(ReminderSchedule {
        id: row.get(0)?,
        date: parse_date(&row.get::<_, String>(1)?),
        timezone: row.get(2)?,
        local_time: parse_time(&row.get::<_, String>(3)?),
        utc_time: parse_naive_datetime(&row.get::<_, String>(4)?),
        sent: row.get::<_, i32>(5)? != 0,
        users_count: row.get(6)?,
        users_sent: row.get(7)?,
        created_at: parse_datetime_utc(&row.get::<_, String>(8)?),
    })
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FMT).unwrap_or_default()
}

fn parse_time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, TIME_FMT).unwrap_or_default()
}

fn parse_naive_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_default()
}

fn parse_datetime_utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_default()
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn upsert_user(&self, user: &User) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users
                 (user_id, username, first_name, last_name, timezone, reminder_enabled, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user_id) DO UPDATE SET
                 username = excluded.username,
                 first_name = excluded.first_name,
                 last_name = excluded.last_name",
            rusqlite::params![
                user.user_id,
                user.username,
                user.first_name,
                user.last_name,
                user.timezone,
                user.reminder_enabled as i32,
                user.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| GratibotError::Storage(format!("Upsert user: {e}")))?;
        Ok(())
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT user_id, username, first_name, last_name, timezone, reminder_enabled, created_at
                 FROM users WHERE user_id = ?1",
            )
            .map_err(|e| GratibotError::Storage(format!("Get user: {e}")))?;
        Ok(stmt.query_row(rusqlite::params![user_id], row_to_user).ok())
    }

    async fn set_reminder_enabled(&self, user_id: i64, enabled: bool) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE users SET reminder_enabled = ?2 WHERE user_id = ?1",
                rusqlite::params![user_id, enabled as i32],
            )
            .map_err(|e| GratibotError::Storage(format!("Set reminder flag: {e}")))?;
        Ok(changed > 0)
    }

    async fn set_timezone(&self, user_id: i64, timezone: &str) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE users SET timezone = ?2 WHERE user_id = ?1",
                rusqlite::params![user_id, timezone],
            )
            .map_err(|e| GratibotError::Storage(format!("Set timezone: {e}")))?;
        Ok(changed > 0)
    }

    async fn users_with_reminders_enabled(&self) -> Result<Vec<User>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT user_id, username, first_name, last_name, timezone, reminder_enabled, created_at
                 FROM users WHERE reminder_enabled = 1 ORDER BY user_id",
            )
            .map_err(|e| GratibotError::Storage(format!("List users: {e}")))?;
        let rows = stmt
            .query_map([], row_to_user)
            .map_err(|e| GratibotError::Storage(format!("List users: {e}")))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

#[async_trait]
impl GratitudeStore for SqliteStore {
    async fn create_entry(&self, entry: GratitudeEntry) -> Result<GratitudeEntry> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO gratitude_entries (id, user_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                entry.id,
                entry.user_id,
                entry.content,
                entry.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| GratibotError::Storage(format!("Save entry: {e}")))?;
        Ok(entry)
    }

    async fn recent_entries(&self, user_id: i64, limit: usize) -> Result<Vec<GratitudeEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, content, created_at FROM gratitude_entries
                 WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2",
            )
            .map_err(|e| GratibotError::Storage(format!("List entries: {e}")))?;
        let rows = stmt
            .query_map(rusqlite::params![user_id, limit as i64], |row| {
                Ok(GratitudeEntry {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    content: row.get(2)?,
                    created_at: parse_datetime_utc(&row.get::<_, String>(3)?),
                })
            })
            .map_err(|e| GratibotError::Storage(format!("List entries: {e}")))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

#[async_trait]
impl ScheduleStore for SqliteStore {
    async fn create_schedule(&self, schedule: ReminderSchedule) -> Result<ReminderSchedule> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO reminder_schedules
                 (id, date, timezone, local_time, utc_time, sent, users_count, users_sent, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO NOTHING",
            rusqlite::params![
                schedule.id,
                schedule.date.format(DATE_FMT).to_string(),
                schedule.timezone,
                schedule.local_time.format(TIME_FMT).to_string(),
                schedule.utc_time.format(DATETIME_FMT).to_string(),
                schedule.sent as i32,
                schedule.users_count,
                schedule.users_sent,
                schedule.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| GratibotError::Storage(format!("Save schedule: {e}")))?;

        // Read back: on an id conflict the stored record wins.
        let mut stmt = conn
            .prepare(
                "SELECT id, date, timezone, local_time, utc_time, sent, users_count, users_sent, created_at
                 FROM reminder_schedules WHERE id = ?1",
            )
            .map_err(|e| GratibotError::Storage(format!("Load schedule: {e}")))?;
        stmt.query_row(rusqlite::params![schedule.id], row_to_schedule)
            .map_err(|e| GratibotError::Storage(format!("Load schedule: {e}")))
    }

    async fn get_schedule(&self, id: &str) -> Result<Option<ReminderSchedule>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, date, timezone, local_time, utc_time, sent, users_count, users_sent, created_at
                 FROM reminder_schedules WHERE id = ?1",
            )
            .map_err(|e| GratibotError::Storage(format!("Get schedule: {e}")))?;
        Ok(stmt.query_row(rusqlite::params![id], row_to_schedule).ok())
    }

    async fn get_schedules_for_date(&self, date: NaiveDate) -> Result<Vec<ReminderSchedule>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, date, timezone, local_time, utc_time, sent, users_count, users_sent, created_at
                 FROM reminder_schedules WHERE date = ?1 ORDER BY timezone",
            )
            .map_err(|e| GratibotError::Storage(format!("List schedules: {e}")))?;
        let rows = stmt
            .query_map(
                rusqlite::params![date.format(DATE_FMT).to_string()],
                row_to_schedule,
            )
            .map_err(|e| GratibotError::Storage(format!("List schedules: {e}")))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    async fn mark_as_sent(&self, id: &str, users_sent: u32) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE reminder_schedules SET sent = 1, users_sent = ?2 WHERE id = ?1",
                rusqlite::params![id, users_sent],
            )
            .map_err(|e| GratibotError::Storage(format!("Mark sent: {e}")))?;
        Ok(changed > 0)
    }
}
