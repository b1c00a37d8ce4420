//! Double-booking detection between schedules
//!
//! Two schedules collide when they share a key (classroom or tutor), are both
//! in play (the other one is approved), have overlapping month windows, and
//! claim the exact same `(day, start_hour)` slot. Sessions one hour apart on
//! the same day never collide.
//!
//! Callers must pass a frozen snapshot of existing schedules and commit the
//! result in the same serialized step; [`crate::ScheduleBook`] does this.

use classtime_util::ScheduleId;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::{Schedule, Session};

/// Axis a conflict check runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKey {
    Classroom,
    Tutor,
}

impl ConflictKey {
    pub const ALL: [ConflictKey; 2] = [ConflictKey::Classroom, ConflictKey::Tutor];

    fn shares_key(self, a: &Schedule, b: &Schedule) -> bool {
        match self {
            ConflictKey::Classroom => a.classroom_id == b.classroom_id,
            ConflictKey::Tutor => a.tutor_id == b.tutor_id,
        }
    }
}

impl fmt::Display for ConflictKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKey::Classroom => f.write_str("classroom"),
            ConflictKey::Tutor => f.write_str("tutor"),
        }
    }
}

/// First clash found for a candidate on one axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub key: ConflictKey,
    /// The approved schedule already holding the slot
    pub other: ScheduleId,
    pub session: Session,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} clash with {} at {}", self.key, self.other, self.session)
    }
}

/// Find the first approved schedule that double-books `candidate` on `key`.
///
/// `exclude` skips one schedule by identity, so an edited schedule is never
/// compared against its own previous version.
pub fn find_conflict(
    candidate: &Schedule,
    existing: &[Schedule],
    key: ConflictKey,
    exclude: Option<&ScheduleId>,
) -> Option<Conflict> {
    existing
        .iter()
        .filter(|other| other.approved)
        .filter(|other| exclude != Some(&other.id))
        .filter(|other| key.shares_key(candidate, other))
        .filter(|other| candidate.overlaps_window(other))
        .find_map(|other| {
            let session = clashing_session(candidate, other)?;
            debug!(
                candidate = %candidate.id,
                other = %other.id,
                key = %key,
                slot = %session,
                "Schedule conflict found"
            );
            Some(Conflict {
                key,
                other: other.id,
                session,
            })
        })
}

/// Whether any approved schedule double-books `candidate` on `key`
pub fn has_conflict(
    candidate: &Schedule,
    existing: &[Schedule],
    key: ConflictKey,
    exclude: Option<&ScheduleId>,
) -> bool {
    find_conflict(candidate, existing, key, exclude).is_some()
}

fn clashing_session(a: &Schedule, b: &Schedule) -> Option<Session> {
    a.sessions
        .iter()
        .find(|s| b.sessions.iter().any(|o| s.same_slot(o)))
        .copied()
}

/// Outcome of checking both axes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub classroom: Option<Conflict>,
    pub tutor: Option<Conflict>,
}

impl ConflictReport {
    pub fn is_clear(&self) -> bool {
        self.classroom.is_none() && self.tutor.is_none()
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &Conflict> {
        self.classroom.iter().chain(self.tutor.iter())
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clear() {
            return f.write_str("no conflicts");
        }
        let parts: Vec<String> = self.conflicts().map(|c| c.to_string()).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Run the classroom check and the tutor check independently.
pub fn check_conflicts(
    candidate: &Schedule,
    existing: &[Schedule],
    exclude: Option<&ScheduleId>,
) -> ConflictReport {
    ConflictReport {
        classroom: find_conflict(candidate, existing, ConflictKey::Classroom, exclude),
        tutor: find_conflict(candidate, existing, ConflictKey::Tutor, exclude),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DayOfWeek, MonthStamp};
    use proptest::prelude::*;

    fn year_2024(classroom: &str, tutor: &str) -> Schedule {
        Schedule::new(
            classroom,
            tutor,
            "Chemistry",
            MonthStamp::new(2024, 1),
            MonthStamp::new(2024, 12),
        )
    }

    #[test]
    fn same_slot_same_classroom_conflicts() {
        let existing = year_2024("101", "a@school.edu")
            .with_session(DayOfWeek::Tuesday, 9)
            .into_approved();
        let candidate = year_2024("101", "b@school.edu").with_session(DayOfWeek::Tuesday, 9);

        assert!(has_conflict(
            &candidate,
            std::slice::from_ref(&existing),
            ConflictKey::Classroom,
            None
        ));
        assert!(!has_conflict(&candidate, &[existing], ConflictKey::Tutor, None));
    }

    #[test]
    fn adjacent_hours_do_not_conflict() {
        let existing = year_2024("101", "a@school.edu")
            .with_session(DayOfWeek::Tuesday, 9)
            .into_approved();
        let candidate = year_2024("101", "b@school.edu").with_session(DayOfWeek::Tuesday, 10);

        assert!(!has_conflict(&candidate, &[existing], ConflictKey::Classroom, None));
    }

    #[test]
    fn unapproved_schedules_are_ignored() {
        let pending = year_2024("101", "a@school.edu").with_session(DayOfWeek::Friday, 14);
        let candidate = year_2024("101", "b@school.edu").with_session(DayOfWeek::Friday, 14);

        assert!(!has_conflict(&candidate, &[pending], ConflictKey::Classroom, None));
    }

    #[test]
    fn disjoint_windows_do_not_conflict() {
        let spring = Schedule::new("101", "a@x", "Math", MonthStamp::new(2024, 1), MonthStamp::new(2024, 5))
            .with_session(DayOfWeek::Monday, 8)
            .into_approved();
        let autumn = Schedule::new("101", "b@x", "Math", MonthStamp::new(2024, 6), MonthStamp::new(2025, 1))
            .with_session(DayOfWeek::Monday, 8);

        assert!(!has_conflict(&autumn, &[spring], ConflictKey::Classroom, None));
    }

    #[test]
    fn window_touching_in_one_month_conflicts() {
        let earlier = Schedule::new("101", "a@x", "Math", MonthStamp::new(2023, 9), MonthStamp::new(2024, 1))
            .with_session(DayOfWeek::Monday, 8)
            .into_approved();
        let later = Schedule::new("101", "b@x", "Math", MonthStamp::new(2024, 1), MonthStamp::new(2024, 6))
            .with_session(DayOfWeek::Monday, 8);

        assert!(has_conflict(&later, &[earlier], ConflictKey::Classroom, None));
    }

    #[test]
    fn tutor_axis_conflicts_across_classrooms() {
        let existing = year_2024("101", "a@school.edu")
            .with_session(DayOfWeek::Thursday, 16)
            .into_approved();
        let candidate = year_2024("202", "a@school.edu").with_session(DayOfWeek::Thursday, 16);

        let report = check_conflicts(&candidate, &[existing.clone()], None);
        assert!(report.classroom.is_none());
        assert_eq!(
            report.tutor,
            Some(Conflict {
                key: ConflictKey::Tutor,
                other: existing.id,
                session: Session::new(DayOfWeek::Thursday, 16),
            })
        );
        assert!(!report.is_clear());
    }

    #[test]
    fn excluded_schedule_does_not_conflict_with_itself() {
        let original = year_2024("101", "a@school.edu")
            .with_session(DayOfWeek::Monday, 10)
            .into_approved();
        let mut edited = original.clone();
        edited.subject = "Advanced Chemistry".into();

        let existing = vec![original.clone()];
        assert!(has_conflict(&edited, &existing, ConflictKey::Classroom, None));
        assert!(!has_conflict(&edited, &existing, ConflictKey::Classroom, Some(&original.id)));
    }

    #[test]
    fn empty_snapshot_has_no_conflicts() {
        let candidate = year_2024("101", "a@school.edu").with_session(DayOfWeek::Monday, 10);
        assert!(check_conflicts(&candidate, &[], None).is_clear());
    }

    fn arb_schedule() -> impl Strategy<Value = Schedule> {
        (
            prop_oneof![Just("101"), Just("102")],
            prop_oneof![Just("a@x"), Just("b@x")],
            (2023i32..2026, 1u32..=12, 0i32..2, 1u32..=12),
            proptest::collection::vec((1u8..=7, 7u32..=19), 0..4),
        )
            .prop_map(|(room, tutor, (sy, sm, span, em), slots)| {
                let (ey, em) = if span == 0 { (sy, em.max(sm)) } else { (sy + span, em) };
                let mut s = Schedule::new(room, tutor, "Subject", MonthStamp::new(sy, sm), MonthStamp::new(ey, em))
                    .into_approved();
                for (day, hour) in slots {
                    if let Some(day) = DayOfWeek::from_number(day) {
                        s.sessions.push(Session::new(day, hour));
                    }
                }
                s
            })
    }

    proptest! {
        #[test]
        fn conflict_is_symmetric(a in arb_schedule(), b in arb_schedule()) {
            for key in ConflictKey::ALL {
                prop_assert_eq!(
                    has_conflict(&a, std::slice::from_ref(&b), key, None),
                    has_conflict(&b, std::slice::from_ref(&a), key, None)
                );
            }
        }

        #[test]
        fn excluding_self_never_reports_self(a in arb_schedule()) {
            for key in ConflictKey::ALL {
                prop_assert!(!has_conflict(&a, std::slice::from_ref(&a), key, Some(&a.id)));
            }
        }
    }
}
