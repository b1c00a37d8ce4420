//! Instant-class countdown
//!
//! An instant class occupies the one-hour block its start instant falls in.
//! Attendance can be recorded during the last 15 minutes of that block and
//! the class closes itself at the end of the block:
//!
//! ```text
//! block_start            attendance_open        block_end
//!     |------ InProgress ------|--- AttendanceOpen ---|--- Ended ...
//!     0                       45m                    60m
//! ```
//!
//! [`InstantClassWindow::evaluate`] is a pure mapping from `now` to a
//! [`TimerReading`]; hosts poll it about once per second and stop once the
//! phase is [`ClassPhase::Ended`].

use chrono::{DateTime, TimeDelta, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::{BLOCK_MINUTES, TimerEvent};

/// Length of the attendance window at the end of the block
pub const ATTENDANCE_WINDOW_MINUTES: i64 = 15;

/// Time from block start until attendance opens
pub const ATTENDANCE_LEAD_MINUTES: i64 = BLOCK_MINUTES - ATTENDANCE_WINDOW_MINUTES;

/// Phase of an instant class, in lifecycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassPhase {
    /// Class running, attendance not yet open
    InProgress,
    /// Attendees can be added until the block ends
    AttendanceOpen,
    /// Block over; the class is closed
    Ended,
}

impl ClassPhase {
    pub fn is_terminal(self) -> bool {
        self == ClassPhase::Ended
    }
}

/// Everything a countdown display needs for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerReading {
    pub phase: ClassPhase,
    /// Until the block ends (zero once ended)
    pub session_remaining: Duration,
    /// Until attendance opens; only while [`ClassPhase::InProgress`]
    pub attendance_opens_in: Option<Duration>,
    /// Until attendance closes; only while [`ClassPhase::AttendanceOpen`]
    pub attendance_remaining: Option<Duration>,
    /// Elapsed share of the whole block, in `[0, 1]`
    pub session_progress: f64,
    /// Elapsed share of the 45 minutes before attendance opens, in `[0, 1]`
    pub attendance_lead_progress: f64,
    /// Elapsed share of the 15-minute attendance window, in `[0, 1]`
    pub attendance_window_progress: f64,
}

/// Phase boundaries derived from a class start instant
#[derive(Debug, Clone)]
pub struct InstantClassWindow<Tz: TimeZone> {
    class_start: DateTime<Tz>,
    block_start: DateTime<Tz>,
    attendance_open: DateTime<Tz>,
    block_end: DateTime<Tz>,
}

impl<Tz: TimeZone> InstantClassWindow<Tz> {
    pub fn new(class_start: DateTime<Tz>) -> Self {
        let into_hour = TimeDelta::minutes(i64::from(class_start.minute()))
            + TimeDelta::seconds(i64::from(class_start.second()))
            + TimeDelta::nanoseconds(i64::from(class_start.nanosecond()));
        let block_start = class_start.clone() - into_hour;
        let attendance_open = block_start.clone() + TimeDelta::minutes(ATTENDANCE_LEAD_MINUTES);
        let block_end = block_start.clone() + TimeDelta::minutes(BLOCK_MINUTES);

        Self {
            class_start,
            block_start,
            attendance_open,
            block_end,
        }
    }

    pub fn class_start(&self) -> &DateTime<Tz> {
        &self.class_start
    }

    /// Top of the hour the class started in
    pub fn block_start(&self) -> &DateTime<Tz> {
        &self.block_start
    }

    pub fn attendance_open(&self) -> &DateTime<Tz> {
        &self.attendance_open
    }

    /// Last instant attendees can be added; same as [`Self::block_end`]
    pub fn attendance_cutoff(&self) -> &DateTime<Tz> {
        &self.block_end
    }

    pub fn block_end(&self) -> &DateTime<Tz> {
        &self.block_end
    }

    pub fn phase_at(&self, now: &DateTime<Tz>) -> ClassPhase {
        if *now >= self.block_end {
            ClassPhase::Ended
        } else if *now >= self.attendance_open {
            ClassPhase::AttendanceOpen
        } else {
            ClassPhase::InProgress
        }
    }

    pub fn evaluate(&self, now: &DateTime<Tz>) -> TimerReading {
        let phase = self.phase_at(now);
        let session_remaining = remaining(now, &self.block_end);

        TimerReading {
            phase,
            session_remaining,
            attendance_opens_in: (phase == ClassPhase::InProgress)
                .then(|| remaining(now, &self.attendance_open)),
            attendance_remaining: (phase == ClassPhase::AttendanceOpen).then_some(session_remaining),
            session_progress: fraction(now.clone() - self.block_start.clone(), BLOCK_MINUTES),
            attendance_lead_progress: fraction(
                now.clone() - self.block_start.clone(),
                ATTENDANCE_LEAD_MINUTES,
            ),
            attendance_window_progress: fraction(
                now.clone() - self.attendance_open.clone(),
                ATTENDANCE_WINDOW_MINUTES,
            ),
        }
    }
}

fn remaining<Tz: TimeZone>(now: &DateTime<Tz>, until: &DateTime<Tz>) -> Duration {
    (until.clone() - now.clone()).to_std().unwrap_or(Duration::ZERO)
}

fn fraction(elapsed: TimeDelta, span_minutes: i64) -> f64 {
    let span_ms = (span_minutes * 60_000) as f64;
    (elapsed.num_milliseconds() as f64 / span_ms).clamp(0.0, 1.0)
}

/// Host-side helper that turns polled readings into one-shot events
#[derive(Debug, Clone)]
pub struct InstantClassTracker<Tz: TimeZone> {
    label: String,
    window: InstantClassWindow<Tz>,
    last_phase: ClassPhase,
}

impl<Tz: TimeZone> InstantClassTracker<Tz> {
    pub fn new(label: impl Into<String>, class_start: DateTime<Tz>) -> Self {
        Self {
            label: label.into(),
            window: InstantClassWindow::new(class_start),
            last_phase: ClassPhase::InProgress,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn window(&self) -> &InstantClassWindow<Tz> {
        &self.window
    }

    pub fn phase(&self) -> ClassPhase {
        self.last_phase
    }

    pub fn is_finished(&self) -> bool {
        self.last_phase.is_terminal()
    }

    pub fn reading(&self, now: &DateTime<Tz>) -> TimerReading {
        self.window.evaluate(now)
    }

    /// Advance to `now`, emitting an event for each boundary crossed since
    /// the previous tick. Ticks never move the phase backwards.
    pub fn tick(&mut self, now: &DateTime<Tz>) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        let phase = self.window.phase_at(now);
        if phase <= self.last_phase {
            return events;
        }

        if self.last_phase < ClassPhase::AttendanceOpen && phase >= ClassPhase::AttendanceOpen {
            let closes_in = remaining(now, &self.window.block_end);
            info!(
                class = %self.label,
                closes_in_secs = closes_in.as_secs(),
                "Attendance window opened"
            );
            events.push(TimerEvent::AttendanceOpened { closes_in });
        }

        if phase == ClassPhase::Ended {
            let overrun = remaining(&self.window.block_end, now);
            info!(
                class = %self.label,
                overrun_secs = overrun.as_secs(),
                "Instant class closed"
            );
            events.push(TimerEvent::ClassEnded { overrun });
        }

        self.last_phase = phase;
        events
    }
}
