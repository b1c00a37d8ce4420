//! Next-occurrence search and recurrence expansion
//!
//! All functions are pure in `now`: hosts call them on every tick without
//! caching. Weeks start on Monday, matching [`DayOfWeek`] numbering.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone};
use tracing::debug;

use crate::{DayOfWeek, Occurrence, Schedule, Session};

/// Earliest session firing strictly after `now`.
///
/// Searches the rest of the current week, then the whole following week.
/// Returns `None` when `now`'s month is outside the schedule's window or the
/// schedule has no sessions.
///
/// The following-week pass does not re-check the window, so a schedule that
/// expires mid-week can report an occurrence past its last valid month. Use
/// [`next_occurrence_within_window`] when that matters.
pub fn next_occurrence<Tz: TimeZone>(schedule: &Schedule, now: &DateTime<Tz>) -> Option<Occurrence<Tz>> {
    search(schedule, now, |_| true)
}

/// Like [`next_occurrence`], but only accepts occurrences whose calendar
/// month is covered by the schedule.
pub fn next_occurrence_within_window<Tz: TimeZone>(
    schedule: &Schedule,
    now: &DateTime<Tz>,
) -> Option<Occurrence<Tz>> {
    search(schedule, now, |at| schedule.covers_month(at.year(), at.month()))
}

fn search<Tz: TimeZone>(
    schedule: &Schedule,
    now: &DateTime<Tz>,
    accept: impl Fn(&DateTime<Tz>) -> bool,
) -> Option<Occurrence<Tz>> {
    if !schedule.covers_month(now.year(), now.month()) {
        debug!(schedule = %schedule.id, "Outside schedule window");
        return None;
    }

    let monday = week_start(now.date_naive());
    let tz = now.timezone();

    let this_week = earliest_in_week(schedule, monday, &tz, |at| at > now && accept(at));
    if this_week.is_some() {
        return this_week;
    }

    let next_monday = monday.checked_add_days(Days::new(7))?;
    earliest_in_week(schedule, next_monday, &tz, accept)
}

fn earliest_in_week<Tz: TimeZone>(
    schedule: &Schedule,
    monday: NaiveDate,
    tz: &Tz,
    accept: impl Fn(&DateTime<Tz>) -> bool,
) -> Option<Occurrence<Tz>> {
    schedule
        .sessions
        .iter()
        .filter_map(|session| {
            let at = session_datetime(monday, session, tz)?;
            accept(&at).then(|| Occurrence {
                session: *session,
                at,
            })
        })
        .min_by(|a, b| a.at.cmp(&b.at))
}

/// Every occurrence starting in `[from, to)` whose month the schedule covers,
/// in chronological order.
pub fn occurrences_between<Tz: TimeZone>(
    schedule: &Schedule,
    from: &DateTime<Tz>,
    to: &DateTime<Tz>,
) -> Vec<Occurrence<Tz>> {
    let mut occurrences = Vec::new();
    if to <= from || schedule.sessions.is_empty() {
        return occurrences;
    }

    let tz = from.timezone();
    let last_day = to.date_naive();
    let mut monday = week_start(from.date_naive());

    while monday <= last_day {
        for session in &schedule.sessions {
            let Some(at) = session_datetime(monday, session, &tz) else {
                continue;
            };
            if &at >= from && &at < to && schedule.covers_month(at.year(), at.month()) {
                occurrences.push(Occurrence {
                    session: *session,
                    at,
                });
            }
        }
        match monday.checked_add_days(Days::new(7)) {
            Some(next) => monday = next,
            None => break,
        }
    }

    occurrences.sort_by(|a, b| a.at.cmp(&b.at));
    occurrences
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = DayOfWeek::from_chrono(date.weekday()).days_from_monday();
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

fn session_datetime<Tz: TimeZone>(monday: NaiveDate, session: &Session, tz: &Tz) -> Option<DateTime<Tz>> {
    let date = monday.checked_add_days(Days::new(session.day.days_from_monday()))?;
    let time = NaiveTime::from_hms_opt(session.start_hour, 0, 0)?;
    tz.from_local_datetime(&date.and_time(time)).earliest()
}
