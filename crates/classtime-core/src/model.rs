//! Recurrence model: schedules, weekly sessions and their occurrences

use chrono::{DateTime, TimeDelta, TimeZone, Weekday};
use classtime_util::{ClassroomId, ScheduleId, TutorId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Every session occupies exactly one block of this many minutes
pub const BLOCK_MINUTES: i64 = 60;

/// [`BLOCK_MINUTES`] as a std duration
pub const BLOCK_LENGTH: Duration = Duration::from_secs(BLOCK_MINUTES as u64 * 60);

/// Day of the week, numbered Monday = 1 through Sunday = 7
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DayOfWeek {
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
    Sunday = 7,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1..=7 => Some(Self::ALL[usize::from(n - 1)]),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_chrono(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }

    pub fn to_chrono(self) -> Weekday {
        match self {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
        }
    }

    /// Offset from the Monday that starts the week
    pub fn days_from_monday(self) -> u64 {
        u64::from(self.number() - 1)
    }

    pub fn short_name(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Mon",
            DayOfWeek::Tuesday => "Tue",
            DayOfWeek::Wednesday => "Wed",
            DayOfWeek::Thursday => "Thu",
            DayOfWeek::Friday => "Fri",
            DayOfWeek::Saturday => "Sat",
            DayOfWeek::Sunday => "Sun",
        }
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::from_number(n).ok_or_else(|| format!("day of week must be 1-7, got {}", n))
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> Self {
        day.number()
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// One recurring weekly slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Session {
    pub day: DayOfWeek,
    /// Hour of day the one-hour block starts at
    pub start_hour: u32,
}

impl Session {
    pub fn new(day: DayOfWeek, start_hour: u32) -> Self {
        Self { day, start_hour }
    }

    /// Exact-slot equality, the only collision rule the engine applies
    pub fn same_slot(&self, other: &Session) -> bool {
        self.day == other.day && self.start_hour == other.start_hour
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}:00", self.day, self.start_hour)
    }
}

/// Month-granularity point used for schedule validity windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthStamp {
    pub year: i32,
    pub month: u32,
}

impl MonthStamp {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }
}

impl fmt::Display for MonthStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A tutor's recurring weekly commitment, valid for an inclusive month range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub classroom_id: ClassroomId,
    pub tutor_id: TutorId,
    pub subject: String,
    /// Only approved schedules take part in conflict checks
    pub approved: bool,
    pub start_year: i32,
    pub start_month: u32,
    pub end_year: i32,
    pub end_month: u32,
    pub sessions: Vec<Session>,
}

impl Schedule {
    /// New unapproved schedule without sessions
    pub fn new(
        classroom_id: impl Into<ClassroomId>,
        tutor_id: impl Into<TutorId>,
        subject: impl Into<String>,
        start: MonthStamp,
        end: MonthStamp,
    ) -> Self {
        Self {
            id: ScheduleId::new(),
            classroom_id: classroom_id.into(),
            tutor_id: tutor_id.into(),
            subject: subject.into(),
            approved: false,
            start_year: start.year,
            start_month: start.month,
            end_year: end.year,
            end_month: end.month,
            sessions: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: ScheduleId) -> Self {
        self.id = id;
        self
    }

    pub fn with_session(mut self, day: DayOfWeek, start_hour: u32) -> Self {
        self.sessions.push(Session::new(day, start_hour));
        self
    }

    pub fn into_approved(mut self) -> Self {
        self.approved = true;
        self
    }

    pub fn start(&self) -> MonthStamp {
        MonthStamp::new(self.start_year, self.start_month)
    }

    pub fn end(&self) -> MonthStamp {
        MonthStamp::new(self.end_year, self.end_month)
    }

    /// Whether the two validity windows share at least one month
    pub fn overlaps_window(&self, other: &Schedule) -> bool {
        self.start() <= other.end() && other.start() <= self.end()
    }
}

/// A session pinned to a concrete date and time
#[derive(Debug, Clone)]
pub struct Occurrence<Tz: TimeZone> {
    pub session: Session,
    pub at: DateTime<Tz>,
}

impl<Tz: TimeZone> Occurrence<Tz> {
    pub fn ends_at(&self) -> DateTime<Tz> {
        self.at.clone() + TimeDelta::minutes(BLOCK_MINUTES)
    }
}
