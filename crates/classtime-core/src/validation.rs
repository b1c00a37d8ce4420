//! Schedule validation
//!
//! The engine assumes well-formed schedules. Forms, config loading and any
//! server-side enforcement share this one check so they agree on what
//! "well-formed" means.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::{DayOfWeek, MonthStamp, Schedule};

/// Business rules a schedule must satisfy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRules {
    /// Earliest allowed session start hour
    pub first_hour: u32,
    /// Latest allowed session start hour
    pub last_hour: u32,
    /// Reject schedules with two sessions on the same day
    pub unique_session_days: bool,
}

impl Default for ScheduleRules {
    fn default() -> Self {
        Self {
            first_hour: 7,
            last_hour: 19,
            unique_session_days: true,
        }
    }
}

impl ScheduleRules {
    pub fn is_teaching_hour(&self, hour: u32) -> bool {
        (self.first_hour..=self.last_hour).contains(&hour)
    }
}

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Subject cannot be empty")]
    EmptySubject,

    #[error("Schedule has no sessions")]
    NoSessions,

    #[error("Invalid {field} month {month}: must be 1-12")]
    InvalidMonth { field: &'static str, month: u32 },

    #[error("Window ends at {end}, before it starts at {start}")]
    EndBeforeStart { start: MonthStamp, end: MonthStamp },

    #[error("Session on {day} at {hour}:00 is outside teaching hours {first}:00-{last}:00")]
    OutsideTeachingHours {
        day: DayOfWeek,
        hour: u32,
        first: u32,
        last: u32,
    },

    #[error("More than one session on {0}")]
    DuplicateDay(DayOfWeek),

    #[error("{field} year {year} is in the past")]
    YearInPast { field: &'static str, year: i32 },
}

/// Validate a schedule, returning it unchanged or every problem found
pub fn validate(schedule: Schedule, rules: &ScheduleRules) -> Result<Schedule, Vec<ValidationError>> {
    let errors = collect_errors(&schedule, rules);
    if errors.is_empty() {
        Ok(schedule)
    } else {
        Err(errors)
    }
}

/// Validate a schedule being created on `today`: on top of [`validate`],
/// neither window year may lie in the past.
pub fn validate_new(
    schedule: Schedule,
    rules: &ScheduleRules,
    today: NaiveDate,
) -> Result<Schedule, Vec<ValidationError>> {
    let mut errors = collect_errors(&schedule, rules);

    if schedule.start_year < today.year() {
        errors.push(ValidationError::YearInPast {
            field: "start",
            year: schedule.start_year,
        });
    }
    if schedule.end_year < today.year() {
        errors.push(ValidationError::YearInPast {
            field: "end",
            year: schedule.end_year,
        });
    }

    if errors.is_empty() {
        Ok(schedule)
    } else {
        Err(errors)
    }
}

fn collect_errors(schedule: &Schedule, rules: &ScheduleRules) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if schedule.subject.trim().is_empty() {
        errors.push(ValidationError::EmptySubject);
    }

    let mut months_valid = true;
    for (field, month) in [("start", schedule.start_month), ("end", schedule.end_month)] {
        if !(1..=12).contains(&month) {
            months_valid = false;
            errors.push(ValidationError::InvalidMonth { field, month });
        }
    }
    if months_valid && schedule.end() < schedule.start() {
        errors.push(ValidationError::EndBeforeStart {
            start: schedule.start(),
            end: schedule.end(),
        });
    }

    if schedule.sessions.is_empty() {
        errors.push(ValidationError::NoSessions);
    }

    for session in &schedule.sessions {
        if !rules.is_teaching_hour(session.start_hour) {
            errors.push(ValidationError::OutsideTeachingHours {
                day: session.day,
                hour: session.start_hour,
                first: rules.first_hour,
                last: rules.last_hour,
            });
        }
    }

    if rules.unique_session_days {
        let mut seen = HashSet::new();
        for session in &schedule.sessions {
            if !seen.insert(session.day) {
                errors.push(ValidationError::DuplicateDay(session.day));
            }
        }
    }

    errors
}
