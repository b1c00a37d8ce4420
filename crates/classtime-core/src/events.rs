//! Events emitted by the engine's host-side helpers

use std::time::Duration;

/// Emitted by [`crate::InstantClassTracker::tick`] when a boundary is crossed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// The attendance window opened
    AttendanceOpened {
        /// Time left to add attendees
        closes_in: Duration,
    },

    /// The block ended and the class closed itself
    ClassEnded {
        /// How late the tick that observed the end was
        overrun: Duration,
    },
}
