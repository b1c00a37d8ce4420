//! Configuration validation

use crate::schema::{RawConfig, RawDay, RawRules, RawSchedule};
use classtime_core::{
    Conflict, ConflictKey, DayOfWeek, MonthStamp, Schedule, ScheduleRules, Session, ValidationError,
    find_conflict,
};
use classtime_util::{ClassroomId, ScheduleId, TutorId};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// Config validation error
#[derive(Debug, Clone, Error)]
pub enum ConfigValidationError {
    #[error("Schedule '{schedule}': {error}")]
    ScheduleError {
        schedule: String,
        error: ValidationError,
    },

    #[error("Schedule '{schedule}': {message}")]
    InvalidField { schedule: String, message: String },

    #[error("Duplicate schedule ID: {0}")]
    DuplicateScheduleId(String),

    #[error("Duplicate classroom ID: {0}")]
    DuplicateClassroomId(String),

    #[error("Schedule '{schedule}' uses unknown classroom '{classroom}'")]
    UnknownClassroom { schedule: String, classroom: String },

    #[error("Approved schedule '{schedule}' double-books: {conflict}")]
    ApprovedConflict { schedule: String, conflict: Conflict },

    #[error("Rules error: {0}")]
    RulesError(String),

    #[error("Host config error: {0}")]
    HostError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    let rules = convert_rules(&config.rules);

    if rules.first_hour > 23 || rules.last_hour > 23 {
        errors.push(ConfigValidationError::RulesError(
            "teaching hours must be 0-23".into(),
        ));
    }
    if rules.first_hour > rules.last_hour {
        errors.push(ConfigValidationError::RulesError(format!(
            "first_hour {} is after last_hour {}",
            rules.first_hour, rules.last_hour
        )));
    }

    if config.host.tick_millis == Some(0) {
        errors.push(ConfigValidationError::HostError(
            "tick_millis must be positive".into(),
        ));
    }

    let mut classrooms = HashSet::new();
    for classroom in &config.classrooms {
        let id = classroom.id.to_string();
        if !classrooms.insert(id.clone()) {
            errors.push(ConfigValidationError::DuplicateClassroomId(id));
        }
    }

    let mut seen_ids = HashSet::new();
    for schedule in &config.schedules {
        if let Some(id) = &schedule.id
            && !seen_ids.insert(id)
        {
            errors.push(ConfigValidationError::DuplicateScheduleId(id.clone()));
        }
    }

    let mut converted = Vec::new();
    for (index, raw) in config.schedules.iter().enumerate() {
        let name = raw.display_name(index);

        if !classrooms.is_empty() && !classrooms.contains(&raw.classroom.to_string()) {
            errors.push(ConfigValidationError::UnknownClassroom {
                schedule: name.clone(),
                classroom: raw.classroom.to_string(),
            });
        }

        match convert_schedule(raw, index) {
            Ok(schedule) => match classtime_core::validate(schedule, &rules) {
                Ok(schedule) => converted.push((name, schedule)),
                Err(schedule_errors) => {
                    errors.extend(schedule_errors.into_iter().map(|error| {
                        ConfigValidationError::ScheduleError {
                            schedule: name.clone(),
                            error,
                        }
                    }));
                }
            },
            Err(field_errors) => errors.extend(field_errors),
        }
    }

    errors.extend(validate_approved_conflicts(&converted));
    errors
}

/// Approved schedules in a catalog must not double-book each other
fn validate_approved_conflicts(schedules: &[(String, Schedule)]) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    let approved: Vec<Schedule> = schedules
        .iter()
        .filter(|(_, s)| s.approved)
        .map(|(_, s)| s.clone())
        .collect();

    // Each clashing pair is reported once, by the later schedule
    for (position, schedule) in approved.iter().enumerate() {
        let earlier = &approved[..position];
        for key in ConflictKey::ALL {
            if let Some(conflict) = find_conflict(schedule, earlier, key, Some(&schedule.id)) {
                let name = schedules
                    .iter()
                    .find(|(_, s)| s.id == schedule.id)
                    .map(|(name, _)| name.clone())
                    .unwrap_or_else(|| schedule.id.to_string());
                errors.push(ConfigValidationError::ApprovedConflict {
                    schedule: name,
                    conflict,
                });
            }
        }
    }

    errors
}

/// Build the engine's rules from the raw table
pub(crate) fn convert_rules(raw: &RawRules) -> ScheduleRules {
    let defaults = ScheduleRules::default();
    ScheduleRules {
        first_hour: raw.first_hour.unwrap_or(defaults.first_hour),
        last_hour: raw.last_hour.unwrap_or(defaults.last_hour),
        unique_session_days: raw.unique_session_days.unwrap_or(defaults.unique_session_days),
    }
}

/// Convert a raw schedule, reporting every field that fails to parse
pub(crate) fn convert_schedule(raw: &RawSchedule, index: usize) -> Result<Schedule, Vec<ConfigValidationError>> {
    let name = raw.display_name(index);
    let mut errors = Vec::new();
    let mut invalid = |message: String| {
        errors.push(ConfigValidationError::InvalidField {
            schedule: name.clone(),
            message,
        })
    };

    let id = match &raw.id {
        Some(id) => match Uuid::parse_str(id) {
            Ok(uuid) => Some(ScheduleId::from_uuid(uuid)),
            Err(e) => {
                invalid(format!("invalid id '{}': {}", id, e));
                None
            }
        },
        None => Some(ScheduleId::new()),
    };

    let start = parse_month(&raw.start).map_err(|e| invalid(format!("start: {}", e))).ok();
    let end = parse_month(&raw.end).map_err(|e| invalid(format!("end: {}", e))).ok();

    let mut sessions = Vec::new();
    for session in &raw.sessions {
        match parse_day(&session.day) {
            Ok(day) => sessions.push(Session::new(day, session.hour)),
            Err(e) => invalid(e),
        }
    }

    match (id, start, end) {
        (Some(id), Some(start), Some(end)) if errors.is_empty() => {
            let mut schedule = Schedule::new(
                ClassroomId::new(raw.classroom.to_string()),
                TutorId::new(raw.tutor.clone()),
                raw.subject.clone(),
                start,
                end,
            )
            .with_id(id);
            schedule.approved = raw.approved;
            schedule.sessions = sessions;
            Ok(schedule)
        }
        _ => Err(errors),
    }
}

/// Parse a `YYYY-MM` month
pub fn parse_month(s: &str) -> Result<MonthStamp, String> {
    let (year, month) = s
        .split_once('-')
        .ok_or_else(|| format!("expected YYYY-MM, got '{}'", s))?;

    let year: i32 = year
        .parse()
        .map_err(|_| format!("invalid year in '{}'", s))?;
    let month: u32 = month
        .parse()
        .map_err(|_| format!("invalid month in '{}'", s))?;

    if !(1..=12).contains(&month) {
        return Err(format!("month must be 1-12, got {}", month));
    }

    Ok(MonthStamp::new(year, month))
}

/// Parse a day as a 1-7 number (Monday = 1) or a day name
pub fn parse_day(day: &RawDay) -> Result<DayOfWeek, String> {
    match day {
        RawDay::Number(n) => {
            DayOfWeek::from_number(*n).ok_or_else(|| format!("day must be 1-7, got {}", n))
        }
        RawDay::Name(name) => match name.to_lowercase().as_str() {
            "mon" | "monday" => Ok(DayOfWeek::Monday),
            "tue" | "tuesday" => Ok(DayOfWeek::Tuesday),
            "wed" | "wednesday" => Ok(DayOfWeek::Wednesday),
            "thu" | "thursday" => Ok(DayOfWeek::Thursday),
            "fri" | "friday" => Ok(DayOfWeek::Friday),
            "sat" | "saturday" => Ok(DayOfWeek::Saturday),
            "sun" | "sunday" => Ok(DayOfWeek::Sunday),
            other => Err(format!("Unknown day: {}", other)),
        },
    }
}
