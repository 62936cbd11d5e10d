//! Pipeline schedules
//!
//! A schedule is a declaration consumed by the host scheduler: a cron
//! recurrence, a fixed start date, and whether missed runs are backfilled.
//! The run driver never acts on it.

use chrono::{DateTime, Duration, Utc};
use cron::Schedule as CronSchedule;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while declaring a schedule
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCron { expression: String, reason: String },
}

/// Recurrence declaration for a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Five-field cron expression (minute resolution)
    pub cron: String,

    /// Runs are never scheduled before this instant
    pub start_date: DateTime<Utc>,

    /// Backfill runs missed since `start_date` when true
    pub catchup: bool,
}

impl Schedule {
    /// Declare a schedule, validating the cron expression
    pub fn new(
        cron: impl Into<String>,
        start_date: DateTime<Utc>,
        catchup: bool,
    ) -> Result<Self, ScheduleError> {
        let cron = cron.into();
        parse_cron(&cron)?;
        Ok(Self {
            cron,
            start_date,
            catchup,
        })
    }

    /// Hourly schedule (`0 * * * *`) with no backfill of missed runs
    pub fn hourly(start_date: DateTime<Utc>) -> Self {
        Self {
            cron: "0 * * * *".to_string(),
            start_date,
            catchup: false,
        }
    }

    /// Next fire time strictly after `after`, never before the start date.
    ///
    /// Returns `None` when the expression yields no further fire times.
    pub fn next_after(&self, after: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, ScheduleError> {
        let parsed = parse_cron(&self.cron)?;
        let anchor = after.max(self.start_date - Duration::seconds(1));
        Ok(parsed.after(&anchor).next())
    }
}

/// Parse a cron expression, accepting the five-field form.
///
/// The underlying parser wants a seconds field; a five-field expression is
/// pinned to second zero before parsing.
fn parse_cron(expression: &str) -> Result<CronSchedule, ScheduleError> {
    let fields = expression.split_whitespace().count();
    let normalized = if fields == 5 {
        format!("0 {expression}")
    } else {
        expression.to_string()
    };

    CronSchedule::from_str(&normalized).map_err(|e| ScheduleError::InvalidCron {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 21, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_hourly_schedule() {
        let schedule = Schedule::hourly(start());
        assert_eq!(schedule.cron, "0 * * * *");
        assert!(!schedule.catchup);
    }

    #[test]
    fn test_five_field_expression_accepted() {
        assert!(Schedule::new("0 * * * *", start(), false).is_ok());
        assert!(Schedule::new("30 4 * * 1", start(), true).is_ok());
    }

    #[test]
    fn test_invalid_expression_rejected() {
        let err = Schedule::new("not a cron", start(), false).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidCron { .. }));
    }

    #[test]
    fn test_next_after_is_top_of_next_hour() {
        let schedule = Schedule::hourly(start());
        let after = Utc.with_ymd_and_hms(2024, 8, 21, 10, 15, 0).unwrap();
        let next = schedule.next_after(after).unwrap().unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 8, 21, 11, 0, 0).unwrap());
    }

    #[test]
    fn test_next_after_clamps_to_start_date() {
        let schedule = Schedule::hourly(start());
        let long_before = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let next = schedule.next_after(long_before).unwrap().unwrap();
        assert_eq!(next, start());
    }
}
