//! In-memory schedule book with serialized approval
//!
//! Approving a schedule is a check-then-act step: take a snapshot of the
//! approved schedules, run the conflict detector on both axes, then commit.
//! The book holds one lock across all three so two clashing schedules
//! approved concurrently cannot both win.

use classtime_util::{ClassroomId, ScheduleId, TutorId};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{ConflictReport, Schedule, ScheduleRules, ValidationError, check_conflicts, validate};

/// Schedule book errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    #[error("Schedule not found: {0}")]
    NotFound(ScheduleId),

    #[error("Schedule already exists: {0}")]
    AlreadyExists(ScheduleId),

    #[error("Schedule is invalid: {0:?}")]
    Invalid(Vec<ValidationError>),

    #[error("Schedule conflicts with an approved schedule: {0}")]
    Conflict(ConflictReport),
}

pub type BookResult<T> = Result<T, BookError>;

/// Schedules known to a host, approved or pending
pub struct ScheduleBook {
    rules: ScheduleRules,
    schedules: Mutex<Vec<Schedule>>,
}

impl ScheduleBook {
    pub fn new(rules: ScheduleRules) -> Self {
        Self::from_snapshot(rules, Vec::new())
    }

    /// Load schedules as they are, approval state included
    pub fn from_snapshot(rules: ScheduleRules, schedules: Vec<Schedule>) -> Self {
        debug!(count = schedules.len(), "Schedule book loaded");
        Self {
            rules,
            schedules: Mutex::new(schedules),
        }
    }

    pub fn rules(&self) -> &ScheduleRules {
        &self.rules
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Schedule>> {
        self.schedules.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate and add a schedule as pending approval
    pub fn submit(&self, schedule: Schedule) -> BookResult<ScheduleId> {
        let mut schedule = validate(schedule, &self.rules).map_err(BookError::Invalid)?;
        schedule.approved = false;

        let mut schedules = self.lock();
        if schedules.iter().any(|s| s.id == schedule.id) {
            return Err(BookError::AlreadyExists(schedule.id));
        }

        let id = schedule.id;
        info!(
            schedule = %id,
            classroom = %schedule.classroom_id,
            tutor = %schedule.tutor_id,
            "Schedule submitted"
        );
        schedules.push(schedule);
        Ok(id)
    }

    /// Approve a pending schedule if it clashes with no approved one
    pub fn approve(&self, id: &ScheduleId) -> BookResult<()> {
        let mut schedules = self.lock();
        let index = position(&schedules, id)?;
        if schedules[index].approved {
            return Ok(());
        }

        let report = check_conflicts(&schedules[index], &schedules, Some(id));
        if !report.is_clear() {
            warn!(schedule = %id, conflicts = %report, "Approval rejected");
            return Err(BookError::Conflict(report));
        }

        schedules[index].approved = true;
        info!(schedule = %id, "Schedule approved");
        Ok(())
    }

    /// Replace a schedule's content, keeping its approval state.
    ///
    /// Edits to an approved schedule are re-checked against every other
    /// approved schedule, never against the schedule's own previous version.
    pub fn update(&self, schedule: Schedule) -> BookResult<()> {
        let mut schedule = validate(schedule, &self.rules).map_err(BookError::Invalid)?;

        let mut schedules = self.lock();
        let index = position(&schedules, &schedule.id)?;
        schedule.approved = schedules[index].approved;

        if schedule.approved {
            let report = check_conflicts(&schedule, &schedules, Some(&schedule.id));
            if !report.is_clear() {
                warn!(schedule = %schedule.id, conflicts = %report, "Edit rejected");
                return Err(BookError::Conflict(report));
            }
        }

        info!(schedule = %schedule.id, "Schedule updated");
        schedules[index] = schedule;
        Ok(())
    }

    /// Remove a schedule, returning it
    pub fn withdraw(&self, id: &ScheduleId) -> BookResult<Schedule> {
        let mut schedules = self.lock();
        let index = position(&schedules, id)?;
        info!(schedule = %id, "Schedule withdrawn");
        Ok(schedules.remove(index))
    }

    pub fn get(&self, id: &ScheduleId) -> Option<Schedule> {
        self.lock().iter().find(|s| &s.id == id).cloned()
    }

    /// Frozen copy of every schedule
    pub fn snapshot(&self) -> Vec<Schedule> {
        self.lock().clone()
    }

    pub fn approved_for_classroom(&self, classroom: &ClassroomId) -> Vec<Schedule> {
        self.lock()
            .iter()
            .filter(|s| s.approved && &s.classroom_id == classroom)
            .cloned()
            .collect()
    }

    pub fn approved_for_tutor(&self, tutor: &TutorId) -> Vec<Schedule> {
        self.lock()
            .iter()
            .filter(|s| s.approved && &s.tutor_id == tutor)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn position(schedules: &[Schedule], id: &ScheduleId) -> BookResult<usize> {
    schedules
        .iter()
        .position(|s| &s.id == id)
        .ok_or(BookError::NotFound(*id))
}
