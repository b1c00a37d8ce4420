//! Validated catalog structures

use crate::schema::{RawClassroom, RawConfig, RawHostConfig};
use crate::validation::{convert_rules, convert_schedule};
use classtime_core::{Schedule, ScheduleBook, ScheduleRules};
use classtime_util::{ClassroomId, ScheduleId};
use std::time::Duration;

/// Validated configuration ready for use by a host
#[derive(Debug, Clone)]
pub struct Catalog {
    pub rules: ScheduleRules,
    pub host: HostConfig,
    pub classrooms: Vec<Classroom>,
    pub schedules: Vec<Schedule>,
}

impl Catalog {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let schedules = raw
            .schedules
            .iter()
            .enumerate()
            .filter_map(|(index, s)| convert_schedule(s, index).ok())
            .collect();

        Self {
            rules: convert_rules(&raw.rules),
            host: HostConfig::from_raw(&raw.host),
            classrooms: raw.classrooms.into_iter().map(Classroom::from_raw).collect(),
            schedules,
        }
    }

    /// Get schedule by ID
    pub fn get_schedule(&self, id: &ScheduleId) -> Option<&Schedule> {
        self.schedules.iter().find(|s| &s.id == id)
    }

    /// Display label for a classroom, falling back to its id
    pub fn classroom_label(&self, id: &ClassroomId) -> String {
        self.classrooms
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.label.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn approved(&self) -> impl Iterator<Item = &Schedule> {
        self.schedules.iter().filter(|s| s.approved)
    }

    /// Hand the schedules to a book that serializes further approvals
    pub fn into_book(self) -> ScheduleBook {
        ScheduleBook::from_snapshot(self.rules, self.schedules)
    }
}

/// Host settings
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// How often countdown displays re-evaluate the timer
    pub tick_interval: Duration,
    /// Use the window-checked next-occurrence search
    pub strict_occurrences: bool,
}

impl HostConfig {
    fn from_raw(raw: &RawHostConfig) -> Self {
        Self {
            tick_interval: raw
                .tick_millis
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TICK_INTERVAL),
            strict_occurrences: raw.strict_occurrences,
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            strict_occurrences: false,
        }
    }
}

/// Countdown displays refresh once per second unless configured otherwise
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Classroom directory entry
#[derive(Debug, Clone)]
pub struct Classroom {
    pub id: ClassroomId,
    pub label: String,
}

impl Classroom {
    fn from_raw(raw: RawClassroom) -> Self {
        let id = raw.id.to_string();
        Self {
            label: raw.label.unwrap_or_else(|| id.clone()),
            id: ClassroomId::new(id),
        }
    }
}
