//! Integration tests for classtime
//!
//! These tests drive a configuration through the book, the occurrence
//! resolver and the instant-class timer the way the host does.

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use classtime_config::{ConfigError, ConfigValidationError, load_config, parse_config};
use classtime_core::{
    BookError, ClassPhase, ConflictKey, DayOfWeek, InstantClassTracker, MonthStamp, Schedule,
    TimerEvent, check_conflicts, next_occurrence, next_occurrence_within_window,
    occurrences_between,
};
use classtime_util::{ClassroomId, TutorId};
use std::io::Write;
use std::time::Duration;

const SCHOOL: &str = r#"
    config_version = 1

    [rules]
    first_hour = 7
    last_hour = 19

    [host]
    tick_millis = 500

    [[classrooms]]
    id = 101
    label = "Room 101"

    [[classrooms]]
    id = 102
    label = "Room 102"

    [[schedules]]
    id = "6f1c2a8e-3b4d-4c5e-8f9a-0b1c2d3e4f50"
    classroom = 101
    tutor = "ana@school.edu"
    subject = "Algebra"
    approved = true
    start = "2024-01"
    end = "2024-06"
    sessions = [{ day = "mon", hour = 9 }, { day = "wed", hour = 11 }]

    [[schedules]]
    id = "7a2d3b9f-4c5e-4d6f-9a0b-1c2d3e4f5a61"
    classroom = 102
    tutor = "ben@school.edu"
    subject = "Biology"
    approved = true
    start = "2023-09"
    end = "2024-03"
    sessions = [{ day = 3, hour = 11 }]

    [[schedules]]
    id = "8b3e4c0a-5d6f-4e7a-0b1c-2d3e4f5a6b72"
    classroom = 101
    tutor = "cho@school.edu"
    subject = "Chemistry"
    start = "2024-02"
    end = "2024-05"
    sessions = [{ day = "monday", hour = 9 }]
"#;

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

#[test]
fn test_config_loading() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SCHOOL.as_bytes()).unwrap();

    let catalog = load_config(file.path()).unwrap();
    assert_eq!(catalog.schedules.len(), 3);
    assert_eq!(catalog.approved().count(), 2);
    assert_eq!(catalog.host.tick_interval, Duration::from_millis(500));
    assert_eq!(catalog.classroom_label(&ClassroomId::new("101")), "Room 101");
}

#[test]
fn test_pending_schedule_reports_clash_with_approved() {
    let catalog = parse_config(SCHOOL).unwrap();
    let chemistry = catalog
        .schedules
        .iter()
        .find(|s| s.subject == "Chemistry")
        .unwrap();

    let report = check_conflicts(chemistry, &catalog.schedules, Some(&chemistry.id));
    let clash = report.classroom.as_ref().unwrap();
    assert_eq!(clash.key, ConflictKey::Classroom);
    assert_eq!(clash.session.day, DayOfWeek::Monday);
    assert!(report.tutor.is_none());
}

#[test]
fn test_approval_through_book() {
    let catalog = parse_config(SCHOOL).unwrap();
    let chemistry_id = catalog
        .schedules
        .iter()
        .find(|s| s.subject == "Chemistry")
        .map(|s| s.id)
        .unwrap();
    let book = catalog.into_book();

    // Room 101 on Monday 09:00 is taken by Algebra
    assert!(matches!(book.approve(&chemistry_id), Err(BookError::Conflict(_))));

    // Moving to Tuesday clears it
    let mut moved = book.get(&chemistry_id).unwrap();
    moved.sessions[0].day = DayOfWeek::Tuesday;
    book.update(moved).unwrap();
    book.approve(&chemistry_id).unwrap();

    assert_eq!(book.approved_for_classroom(&ClassroomId::new("101")).len(), 2);
    assert_eq!(book.approved_for_tutor(&TutorId::new("cho@school.edu")).len(), 1);
}

#[test]
fn test_tutor_axis_is_checked_independently() {
    let catalog = parse_config(SCHOOL).unwrap();
    let book = catalog.into_book();

    // Different room, but Ana already teaches Wednesday 11:00
    let overlap = Schedule::new(
        "102",
        "ana@school.edu",
        "Geometry",
        MonthStamp::new(2024, 3),
        MonthStamp::new(2024, 4),
    )
    .with_session(DayOfWeek::Wednesday, 11);
    let id = book.submit(overlap).unwrap();

    match book.approve(&id) {
        Err(BookError::Conflict(report)) => {
            // Room 102 on Wednesday 11:00 is also Biology's until March
            assert!(report.classroom.is_some());
            assert_eq!(report.tutor.map(|c| c.key), Some(ConflictKey::Tutor));
        }
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[test]
fn test_disjoint_windows_share_a_slot() {
    let catalog = parse_config(SCHOOL).unwrap();
    let book = catalog.into_book();

    // Biology ends in March 2024; a Room 102 class from April can take its slot
    let successor = Schedule::new(
        "102",
        "dee@school.edu",
        "Physics",
        MonthStamp::new(2024, 4),
        MonthStamp::new(2024, 12),
    )
    .with_session(DayOfWeek::Wednesday, 11);
    let id = book.submit(successor).unwrap();
    book.approve(&id).unwrap();
}

#[test]
fn test_approved_clash_in_config_is_rejected() {
    let config = SCHOOL.replace(
        "subject = \"Chemistry\"\n",
        "subject = \"Chemistry\"\n    approved = true\n",
    );

    match parse_config(&config) {
        Err(ConfigError::ValidationFailed { errors }) => {
            assert_eq!(errors.len(), 1);
            assert!(matches!(errors[0], ConfigValidationError::ApprovedConflict { .. }));
        }
        other => panic!("expected validation failure, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_next_occurrences_for_catalog() {
    let catalog = parse_config(SCHOOL).unwrap();
    let algebra = catalog
        .schedules
        .iter()
        .find(|s| s.subject == "Algebra")
        .unwrap();

    // Tuesday 2024-01-09: Wednesday 11:00 is next
    let next = next_occurrence(algebra, &utc(2024, 1, 9, 12, 0)).unwrap();
    assert_eq!(next.at, utc(2024, 1, 10, 11, 0));
    assert_eq!(next.ends_at(), utc(2024, 1, 10, 12, 0));

    // Wednesday after class: rolls to Monday
    let next = next_occurrence(algebra, &utc(2024, 1, 10, 11, 30)).unwrap();
    assert_eq!(next.at, utc(2024, 1, 15, 9, 0));

    // July is past the window
    assert!(next_occurrence(algebra, &utc(2024, 7, 1, 8, 0)).is_none());
}

#[test]
fn test_strict_next_occurrence_at_window_end() {
    let catalog = parse_config(SCHOOL).unwrap();
    let biology = catalog
        .schedules
        .iter()
        .find(|s| s.subject == "Biology")
        .unwrap();

    // Thursday 2024-03-28: the following Wednesday is April 3rd
    let now = utc(2024, 3, 28, 12, 0);
    let reference = next_occurrence(biology, &now).unwrap();
    assert_eq!(reference.at, utc(2024, 4, 3, 11, 0));
    assert!(next_occurrence_within_window(biology, &now).is_none());
}

#[test]
fn test_week_expansion() {
    let catalog = parse_config(SCHOOL).unwrap();
    let from = utc(2024, 1, 8, 0, 0);
    let to = from + TimeDelta::days(7);

    let mut starts: Vec<DateTime<Utc>> = catalog
        .approved()
        .flat_map(|s| occurrences_between(s, &from, &to))
        .map(|o| o.at)
        .collect();
    starts.sort();

    assert_eq!(
        starts,
        vec![
            utc(2024, 1, 8, 9, 0),
            utc(2024, 1, 10, 11, 0),
            utc(2024, 1, 10, 11, 0),
        ]
    );
    assert_eq!(
        NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
        classtime_core::week_start(NaiveDate::from_ymd_opt(2024, 1, 14).unwrap())
    );
}

#[test]
fn test_instant_class_lifecycle() {
    let start = utc(2024, 5, 6, 14, 12);
    let mut tracker = InstantClassTracker::new("Office hours", start);

    let mut now = start;
    let mut events = Vec::new();
    while !tracker.is_finished() {
        events.extend(tracker.tick(&now));
        now += TimeDelta::minutes(1);
    }

    assert_eq!(
        events,
        vec![
            TimerEvent::AttendanceOpened {
                closes_in: Duration::from_secs(15 * 60)
            },
            TimerEvent::ClassEnded {
                overrun: Duration::ZERO
            },
        ]
    );
    assert_eq!(tracker.phase(), ClassPhase::Ended);

    // Late ticks change nothing
    assert!(tracker.tick(&utc(2024, 5, 6, 18, 0)).is_empty());
}

#[test]
fn test_instant_class_reading_mid_window() {
    let tracker = InstantClassTracker::new("Review", utc(2024, 5, 6, 14, 12));
    let reading = tracker.reading(&utc(2024, 5, 6, 14, 50));

    assert_eq!(reading.phase, ClassPhase::AttendanceOpen);
    assert_eq!(reading.session_remaining, Duration::from_secs(10 * 60));
    assert_eq!(reading.attendance_remaining, Some(Duration::from_secs(10 * 60)));
    assert_eq!(reading.attendance_opens_in, None);
    assert!((reading.attendance_window_progress - 1.0 / 3.0).abs() < 1e-9);
}
