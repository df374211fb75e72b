//! Timezone planning: local-to-UTC conversion, cohort grouping, validation.

use std::collections::BTreeMap;

use chrono::{LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use gratibot_core::types::User;

/// Cohort name for users who never picked a timezone.
pub const UTC_TZ: &str = "UTC";

/// Timezones the bot accepts for storage. IANA names only.
pub const SUPPORTED_TIMEZONES: &[&str] = &[
    UTC_TZ,
    "Europe/London",
    "Europe/Warsaw",
    "Europe/Moscow",
    "Europe/Berlin",
    "Europe/Paris",
    "America/New_York",
    "America/Chicago",
    "America/Los_Angeles",
    "Asia/Tokyo",
    "Asia/Shanghai",
    "Asia/Dubai",
    "Asia/Kolkata",
    "Asia/Almaty",
];

/// Timezone decisions the schedule generator depends on.
pub trait TimezonePlanner: Send + Sync {
    /// Convert a wall-clock time in `timezone` on `date` to the matching UTC
    /// instant, returned naive. `None`, empty, and unknown names collapse to
    /// UTC, so the result is always usable.
    fn convert_to_utc(
        &self,
        local: NaiveTime,
        timezone: Option<&str>,
        date: NaiveDate,
    ) -> NaiveDateTime;

    /// Group users into cohorts keyed by timezone name. Users without a
    /// timezone land under [`UTC_TZ`].
    fn group_by_timezone(&self, users: &[User]) -> BTreeMap<String, Vec<i64>>;

    /// Whether `timezone` may be stored for a user. `None` and empty mean
    /// "use UTC" and always pass.
    fn validate_timezone(&self, timezone: Option<&str>) -> bool;
}

/// Planner backed by the embedded tz database.
#[derive(Debug, Clone, Copy, Default)]
pub struct TzDatabasePlanner;

impl TimezonePlanner for TzDatabasePlanner {
    fn convert_to_utc(
        &self,
        local: NaiveTime,
        timezone: Option<&str>,
        date: NaiveDate,
    ) -> NaiveDateTime {
        let name = match timezone {
            Some(t) if !t.is_empty() && t != UTC_TZ => t,
            _ => return date.and_time(local),
        };
        let tz: Tz = match name.parse() {
            Ok(tz) => tz,
            Err(_) => {
                tracing::error!("Unknown timezone {name}, scheduling in UTC instead");
                return date.and_time(local);
            }
        };
        let local_dt = date.and_time(local);
        match tz.from_local_datetime(&local_dt) {
            LocalResult::Single(dt) => dt.naive_utc(),
            // Clocks fell back: the wall-clock time happens twice. Take the
            // earlier instant so the reminder is never late.
            LocalResult::Ambiguous(earliest, _) => {
                tracing::warn!("⚠️ Ambiguous local time {local_dt} in {name}, using earlier offset");
                earliest.naive_utc()
            }
            // Clocks sprang forward over the wall-clock time. No correct
            // instant exists; treat the wall clock as UTC.
            LocalResult::None => {
                tracing::error!("Local time {local_dt} does not exist in {name}, scheduling in UTC");
                local_dt
            }
        }
    }

    fn group_by_timezone(&self, users: &[User]) -> BTreeMap<String, Vec<i64>> {
        let mut cohorts: BTreeMap<String, Vec<i64>> = BTreeMap::new();
        for user in users {
            cohorts
                .entry(cohort_timezone(user).to_string())
                .or_default()
                .push(user.user_id);
        }
        cohorts
    }

    fn validate_timezone(&self, timezone: Option<&str>) -> bool {
        match timezone {
            None | Some("") => true,
            Some(t) => SUPPORTED_TIMEZONES.contains(&t) && t.parse::<Tz>().is_ok(),
        }
    }
}

/// The cohort a user dispatches in: their timezone, or [`UTC_TZ`].
pub fn cohort_timezone(user: &User) -> &str {
    match user.timezone.as_deref() {
        Some(t) if !t.is_empty() => t,
        _ => UTC_TZ,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::user;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_utc_and_missing_timezones_pass_through() {
        let planner = TzDatabasePlanner;
        let d = date(2024, 6, 15);
        let t = time(14, 30);
        assert_eq!(planner.convert_to_utc(t, None, d), d.and_time(t));
        assert_eq!(planner.convert_to_utc(t, Some(""), d), d.and_time(t));
        assert_eq!(planner.convert_to_utc(t, Some("UTC"), d), d.and_time(t));
    }

    #[test]
    fn test_convert_known_offsets() {
        let planner = TzDatabasePlanner;
        let d = date(2024, 6, 15);
        let t = time(14, 30);
        // London in summer is UTC+1.
        assert_eq!(
            planner.convert_to_utc(t, Some("Europe/London"), d),
            d.and_time(time(13, 30))
        );
        // Tokyo is UTC+9 year round.
        assert_eq!(
            planner.convert_to_utc(t, Some("Asia/Tokyo"), d),
            d.and_time(time(5, 30))
        );
        // Moscow is UTC+3 year round.
        assert_eq!(
            planner.convert_to_utc(t, Some("Europe/Moscow"), d),
            d.and_time(time(11, 30))
        );
    }

    #[test]
    fn test_unknown_timezone_falls_back_to_utc() {
        let planner = TzDatabasePlanner;
        let d = date(2024, 6, 15);
        let t = time(9, 0);
        assert_eq!(planner.convert_to_utc(t, Some("Mars/Olympus"), d), d.and_time(t));
    }

    #[test]
    fn test_spring_forward_gap_schedules_in_utc() {
        let planner = TzDatabasePlanner;
        // London clocks jump 01:00 -> 02:00 on 2024-03-31; 01:30 never happens.
        let d = date(2024, 3, 31);
        let t = time(1, 30);
        assert_eq!(planner.convert_to_utc(t, Some("Europe/London"), d), d.and_time(t));
    }

    #[test]
    fn test_fall_back_ambiguity_takes_earlier_instant() {
        let planner = TzDatabasePlanner;
        // London clocks fall back 02:00 -> 01:00 on 2024-10-27; 01:30 happens
        // twice. The first pass is still BST, so 01:30 local is 00:30 UTC.
        let d = date(2024, 10, 27);
        let converted = planner.convert_to_utc(time(1, 30), Some("Europe/London"), d);
        assert_eq!(converted, d.and_time(time(0, 30)));
    }

    #[test]
    fn test_grouping_collects_cohorts() {
        let planner = TzDatabasePlanner;
        let users = vec![
            user(1, Some("Europe/London")),
            user(2, None),
            user(3, Some("Europe/London")),
            user(4, Some("Asia/Tokyo")),
        ];
        let cohorts = planner.group_by_timezone(&users);
        assert_eq!(cohorts.len(), 3);
        assert_eq!(cohorts["Europe/London"], vec![1, 3]);
        assert_eq!(cohorts["Asia/Tokyo"], vec![4]);
        assert_eq!(cohorts[UTC_TZ], vec![2]);
    }

    #[test]
    fn test_validate_timezone() {
        let planner = TzDatabasePlanner;
        assert!(planner.validate_timezone(None));
        assert!(planner.validate_timezone(Some("")));
        assert!(planner.validate_timezone(Some("UTC")));
        assert!(planner.validate_timezone(Some("Europe/Warsaw")));
        assert!(planner.validate_timezone(Some("Asia/Almaty")));
        // Real zone, but not one the bot offers.
        assert!(!planner.validate_timezone(Some("Australia/Sydney")));
        assert!(!planner.validate_timezone(Some("Mars/Olympus")));
    }

    #[test]
    fn test_cohort_timezone_defaults_to_utc() {
        assert_eq!(cohort_timezone(&user(1, None)), UTC_TZ);
        assert_eq!(cohort_timezone(&user(2, Some(""))), UTC_TZ);
        assert_eq!(cohort_timezone(&user(3, Some("Asia/Dubai"))), "Asia/Dubai");
    }
}
