//! # Gratibot Scheduler
//!
//! Timezone-aware daily reminder scheduling: one random time per day,
//! delivered to every user at that wall-clock time in their own timezone.
//!
//! ## Day cycle
//! ```text
//! ReminderLoop (per UTC day)
//!   ├── ScheduleGenerator: draw base time in [09:00, 20:00]
//!   │     ├── TimezonePlanner: group users into timezone cohorts
//!   │     └── one ReminderSchedule row per cohort (local → UTC)
//!   ├── arm a tokio timer per unsent schedule still ahead of now
//!   │     └── on fire → re-read cohort → notify each user → mark sent
//!   ├── schedules whose time already passed: skipped, never late
//!   └── sleep until next UTC midnight, repeat
//! ```

pub mod dispatch;
pub mod generator;
pub mod timezone;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatch::ReminderLoop;
pub use generator::{random_base_time, ScheduleGenerator, WINDOW_END_MINUTES, WINDOW_START_MINUTES};
pub use timezone::{
    cohort_timezone, TimezonePlanner, TzDatabasePlanner, SUPPORTED_TIMEZONES, UTC_TZ,
};
