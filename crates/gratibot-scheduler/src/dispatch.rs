//! Reminder dispatch.
//!
//! One long-lived loop per process. Every UTC day it makes sure schedules
//! exist, arms a timer per unsent schedule still ahead of now, and sleeps
//! until the next UTC midnight. A fired timer re-reads the cohort, notifies
//! each member, and marks the schedule sent exactly once. Schedules whose
//! time already passed are skipped, never delivered late.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use gratibot_core::traits::{ReminderNotifier, ScheduleStore, UserStore};
use gratibot_core::types::ReminderSchedule;
use gratibot_core::ReminderMode;

use crate::generator::ScheduleGenerator;
use crate::timezone::cohort_timezone;

pub struct ReminderLoop {
    generator: Arc<ScheduleGenerator>,
    users: Arc<dyn UserStore>,
    schedules: Arc<dyn ScheduleStore>,
    notifier: Arc<dyn ReminderNotifier>,
    mode: ReminderMode,
}

impl ReminderLoop {
    pub fn new(
        generator: Arc<ScheduleGenerator>,
        users: Arc<dyn UserStore>,
        schedules: Arc<dyn ScheduleStore>,
        notifier: Arc<dyn ReminderNotifier>,
        mode: ReminderMode,
    ) -> Self {
        Self {
            generator,
            users,
            schedules,
            notifier,
            mode,
        }
    }

    /// Run forever. Arms today's reminders immediately, then once per UTC
    /// midnight.
    pub async fn run(self: Arc<Self>) {
        tracing::info!("⏰ Reminder loop started");
        loop {
            let today = Utc::now().date_naive();
            self.clone().arm_for_date(today).await;

            let wait = until_next_midnight(Utc::now());
            tracing::info!("📅 Next schedule generation in {}s", wait.as_secs());
            tokio::time::sleep(wait).await;
        }
    }

    async fn arm_for_date(self: Arc<Self>, date: NaiveDate) {
        let schedules = match self.generator.generate_for_date(date).await {
            Ok(schedules) => schedules,
            Err(e) => {
                tracing::error!("Schedule generation for {date} failed: {e}");
                return;
            }
        };

        let (armed, missed) = split_pending(schedules, Utc::now().naive_utc());
        for schedule in missed {
            tracing::warn!(
                "⚠️ Reminder time {} UTC already passed for {}, skipping",
                schedule.utc_time.format("%H:%M"),
                schedule.timezone
            );
        }
        for schedule in armed {
            let delay = (schedule.utc_time.and_utc() - Utc::now())
                .to_std()
                .unwrap_or(Duration::ZERO);
            tracing::info!(
                "🔔 Armed {} in {}s ({} user(s))",
                schedule.id,
                delay.as_secs(),
                schedule.users_count
            );
            let loop_ref = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                loop_ref.dispatch(schedule).await;
            });
        }
    }

    /// Deliver one schedule. The cohort is re-read here so members who
    /// registered, left, or switched timezone since generation are handled
    /// correctly.
    async fn dispatch(&self, schedule: ReminderSchedule) {
        let users = match self.users.users_with_reminders_enabled().await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!("Could not load users for {}: {e}", schedule.id);
                return;
            }
        };

        let mut sent = 0u32;
        for user in users.iter().filter(|u| {
            self.mode == ReminderMode::UtcOnly || cohort_timezone(u) == schedule.timezone
        }) {
            match self.notifier.notify(user).await {
                Ok(()) => sent += 1,
                Err(e) => tracing::error!("Failed to remind user {}: {e}", user.user_id),
            }
        }
        tracing::info!(
            "✅ {}: reminded {}/{} user(s)",
            schedule.id,
            sent,
            schedule.users_count
        );

        match self.schedules.mark_as_sent(&schedule.id, sent).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("Schedule {} vanished before it could be marked sent", schedule.id)
            }
            Err(e) => tracing::error!("Failed to mark {} as sent: {e}", schedule.id),
        }
    }
}

/// Split a day's schedules into (still ahead, already missed), dropping
/// anything already sent.
fn split_pending(
    schedules: Vec<ReminderSchedule>,
    now: NaiveDateTime,
) -> (Vec<ReminderSchedule>, Vec<ReminderSchedule>) {
    let mut armed = Vec::new();
    let mut missed = Vec::new();
    for schedule in schedules {
        if schedule.sent {
            continue;
        }
        if schedule.utc_time > now {
            armed.push(schedule);
        } else {
            missed.push(schedule);
        }
    }
    (armed, missed)
}

fn until_next_midnight(now: DateTime<Utc>) -> Duration {
    let tomorrow = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap_or(now.date_naive());
    (tomorrow.and_time(NaiveTime::MIN).and_utc() - now)
        .to_std()
        .unwrap_or(Duration::from_secs(60))
}
