//! Daily schedule generation.
//!
//! Once per day a single random base time is drawn inside the reminder
//! window. Every timezone cohort gets a schedule row for that wall-clock
//! time, converted to its own UTC instant.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use gratibot_core::error::Result;
use gratibot_core::traits::{ScheduleStore, UserStore};
use gratibot_core::types::ReminderSchedule;
use gratibot_core::ReminderMode;
use rand::Rng;

use crate::timezone::{TimezonePlanner, UTC_TZ};

/// Reminder window bounds, minutes after local midnight. Inclusive.
pub const WINDOW_START_MINUTES: u32 = 9 * 60;
pub const WINDOW_END_MINUTES: u32 = 20 * 60;

/// Draw the shared base time for one day, whole minutes only.
pub fn random_base_time() -> NaiveTime {
    let minutes = rand::thread_rng().gen_range(WINDOW_START_MINUTES..=WINDOW_END_MINUTES);
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN)
}

/// Builds the per-cohort schedule rows for a date.
pub struct ScheduleGenerator {
    users: Arc<dyn UserStore>,
    schedules: Arc<dyn ScheduleStore>,
    planner: Arc<dyn TimezonePlanner>,
    mode: ReminderMode,
}

impl ScheduleGenerator {
    pub fn new(
        users: Arc<dyn UserStore>,
        schedules: Arc<dyn ScheduleStore>,
        planner: Arc<dyn TimezonePlanner>,
        mode: ReminderMode,
    ) -> Self {
        Self {
            users,
            schedules,
            planner,
            mode,
        }
    }

    /// Return the schedules for `date`, generating them if none exist yet.
    ///
    /// Generation is idempotent: existing rows for the date win, whether
    /// they were written by an earlier call or by another process racing on
    /// the same store. A store failure for one cohort is logged and skipped
    /// so the remaining cohorts still get their reminder.
    pub async fn generate_for_date(&self, date: NaiveDate) -> Result<Vec<ReminderSchedule>> {
        let existing = self.schedules.get_schedules_for_date(date).await?;
        if !existing.is_empty() {
            tracing::debug!("Schedules for {date} already exist, keeping them");
            return Ok(existing);
        }

        let users = self.users.users_with_reminders_enabled().await?;
        if users.is_empty() {
            tracing::info!("No reminder-enabled users, nothing to schedule for {date}");
            return Ok(Vec::new());
        }

        let base_time = random_base_time();
        let cohorts: BTreeMap<String, Vec<i64>> = match self.mode {
            ReminderMode::PerTimezone => self.planner.group_by_timezone(&users),
            ReminderMode::UtcOnly => BTreeMap::from([(
                UTC_TZ.to_string(),
                users.iter().map(|u| u.user_id).collect(),
            )]),
        };

        tracing::info!(
            "📅 Generating {} schedule(s) for {date} at base time {}",
            cohorts.len(),
            base_time.format("%H:%M")
        );

        let mut created = Vec::with_capacity(cohorts.len());
        for (timezone, members) in cohorts {
            let utc_time = self
                .planner
                .convert_to_utc(base_time, Some(timezone.as_str()), date);
            let schedule =
                ReminderSchedule::new(date, &timezone, base_time, utc_time, members.len() as u32);
            match self.schedules.create_schedule(schedule).await {
                Ok(stored) => {
                    tracing::info!(
                        "⏰ {}: {} user(s) at {} UTC",
                        stored.timezone,
                        stored.users_count,
                        stored.utc_time.format("%H:%M")
                    );
                    created.push(stored);
                }
                Err(e) => {
                    tracing::error!("Failed to persist schedule for {timezone} on {date}: {e}");
                }
            }
        }
        Ok(created)
    }

    /// The shared wall-clock reminder time for `date`, generating schedules
    /// on demand. `None` when there is nobody to remind.
    pub async fn reminder_time_for(&self, date: NaiveDate) -> Result<Option<NaiveTime>> {
        let schedules = self.generate_for_date(date).await?;
        Ok(schedules.first().map(|s| s.local_time))
    }
}
