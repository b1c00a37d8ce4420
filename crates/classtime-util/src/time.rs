//! Time utilities for classtime
//!
//! The engine never reads ambient time. Hosts hold a [`Clock`] and pass
//! `now` into every engine call, which keeps every computation replayable
//! against a fixed instant.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `CLASSTIME_MOCK_TIME` environment variable can be set
//! to override the system time seen through [`SystemClock`]. This is useful
//! for checking next-occurrence output and instant-class phases by hand.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2024-01-03 09:55:00`)
//!
//! Example:
//! ```bash
//! CLASSTIME_MOCK_TIME="2024-01-03 09:55:00" classtime next
//! ```

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "CLASSTIME_MOCK_TIME";

/// Format accepted for mock time and for `--at` style overrides
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Cached mock time offset from the real time when the process started.
/// This allows mock time to advance naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

/// Source of "now" for the engine's callers
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock, respecting `CLASSTIME_MOCK_TIME` in debug builds
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        now()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Local>);

impl FixedClock {
    pub fn new(at: DateTime<Local>) -> Self {
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Parse a `YYYY-MM-DD HH:MM:SS` string as a local datetime.
///
/// Returns `None` for malformed input and for local times that do not exist
/// (DST gaps).
pub fn parse_local_datetime(s: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).ok()?;
    Local.from_local_datetime(&naive).earliest()
}

/// Initialize the mock time offset based on the environment variable.
/// Returns the offset between mock time and real time at process start.
#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match parse_local_datetime(&mock_time_str) {
                    Some(mock_dt) => {
                        let offset = mock_dt.signed_duration_since(Local::now());
                        tracing::info!(
                            mock_time = %mock_time_str,
                            offset_secs = offset.num_seconds(),
                            "Mock time enabled"
                        );
                        return Some(offset);
                    }
                    None => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = DATETIME_FORMAT,
                            "Invalid mock time"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = Local::now();

    if let Some(offset) = get_mock_time_offset() {
        real_now + offset
    } else {
        real_now
    }
}

/// Format a datetime as `HH:MM`.
pub fn format_clock_time<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%H:%M").to_string()
}

/// Format a datetime with full date and time.
pub fn format_datetime_full<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format(DATETIME_FORMAT).to_string()
}

/// Helper to format durations in human-readable form
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
