//! Recurring-session scheduling engine for classtime
//!
//! This crate is the heart of classtime, containing:
//! - The recurrence model (schedules of weekly one-hour sessions)
//! - Month-range checks for schedule validity windows
//! - Conflict detection by classroom and by tutor
//! - Next-occurrence search and recurrence expansion
//! - The instant-class countdown (InProgress -> AttendanceOpen -> Ended)
//! - Schedule validation and a serialized approval book
//!
//! Every engine function takes `now` explicitly and performs no I/O.

mod book;
mod conflict;
mod events;
mod model;
mod occurrence;
mod range;
mod timer;
mod validation;

pub use book::*;
pub use conflict::*;
pub use events::*;
pub use model::*;
pub use occurrence::*;
pub use range::*;
pub use timer::*;
pub use validation::*;
