//! Month-range validation for schedule windows

use crate::Schedule;

/// Resolve whether `(year, month)` falls inside the schedule's window.
///
/// Only the boundary years are resolved here: callers must first check that
/// `year` lies within `[start_year, end_year]` (see [`Schedule::covers_month`]).
pub fn is_month_in_range(year: i32, month: u32, schedule: &Schedule) -> bool {
    if schedule.start_year == schedule.end_year {
        (schedule.start_month..=schedule.end_month).contains(&month)
    } else if year == schedule.start_year {
        month >= schedule.start_month
    } else if year == schedule.end_year {
        month <= schedule.end_month
    } else {
        true
    }
}

impl Schedule {
    /// Whether the schedule is valid during the given calendar month
    pub fn covers_month(&self, year: i32, month: u32) -> bool {
        if year < self.start_year || year > self.end_year {
            return false;
        }
        is_month_in_range(year, month, self)
    }
}
