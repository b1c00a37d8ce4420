//! Shared utilities for classtime
//!
//! This crate provides:
//! - ID types (ClassroomId, TutorId, ScheduleId)
//! - An injectable clock with mock time support
//! - Duration and clock formatting helpers
//! - Default config path

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
