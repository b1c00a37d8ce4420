//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Scheduling business rules
    #[serde(default)]
    pub rules: RawRules,

    /// Host polling settings
    #[serde(default)]
    pub host: RawHostConfig,

    /// Known classrooms (optional directory)
    #[serde(default)]
    pub classrooms: Vec<RawClassroom>,

    /// Schedule catalog
    #[serde(default)]
    pub schedules: Vec<RawSchedule>,
}

/// Scheduling rules; unset fields use the engine defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRules {
    /// Earliest session start hour (default 7)
    pub first_hour: Option<u32>,

    /// Latest session start hour (default 19)
    pub last_hour: Option<u32>,

    /// Reject two sessions on the same day within one schedule (default true)
    pub unique_session_days: Option<bool>,
}

/// Host-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawHostConfig {
    /// Polling cadence for countdowns, in milliseconds (default 1000)
    pub tick_millis: Option<u64>,

    /// Drop next occurrences that fall past a schedule's last month
    #[serde(default)]
    pub strict_occurrences: bool,
}

/// Classroom or tutor key: TOML may spell it as a string or an integer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawKey {
    Number(i64),
    Text(String),
}

impl fmt::Display for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawKey::Number(n) => write!(f, "{}", n),
            RawKey::Text(s) => f.write_str(s),
        }
    }
}

/// Classroom directory entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawClassroom {
    pub id: RawKey,

    /// Display label (defaults to the id)
    pub label: Option<String>,
}

/// Raw schedule definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSchedule {
    /// Stable UUID; generated when absent
    pub id: Option<String>,

    pub classroom: RawKey,

    pub tutor: String,

    pub subject: String,

    #[serde(default)]
    pub approved: bool,

    /// First valid month, "YYYY-MM"
    pub start: String,

    /// Last valid month, "YYYY-MM"
    pub end: String,

    #[serde(default)]
    pub sessions: Vec<RawSession>,
}

impl RawSchedule {
    /// Name used in error messages
    pub fn display_name(&self, index: usize) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("#{} ({})", index + 1, self.subject),
        }
    }
}

/// Weekly session
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSession {
    /// 1-7 (Monday = 1) or a day name like "wed"
    pub day: RawDay,

    /// Start hour of the one-hour block
    pub hour: u32,
}

/// Day specification
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawDay {
    Number(u8),
    Name(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_schedule_entry() {
        let toml_str = r#"
            config_version = 1

            [[schedules]]
            classroom = 101
            tutor = "ana@school.edu"
            subject = "Algebra"
            approved = true
            start = "2024-01"
            end = "2024-12"
            sessions = [
                { day = "wed", hour = 10 },
                { day = 5, hour = 8 },
            ]
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.schedules.len(), 1);
        let schedule = &config.schedules[0];
        assert_eq!(schedule.classroom, RawKey::Number(101));
        assert_eq!(schedule.classroom.to_string(), "101");
        assert!(schedule.approved);
        assert_eq!(schedule.sessions.len(), 2);
        assert!(matches!(schedule.sessions[0].day, RawDay::Name(ref d) if d == "wed"));
        assert!(matches!(schedule.sessions[1].day, RawDay::Number(5)));
    }

    #[test]
    fn parse_rules_and_host() {
        let toml_str = r#"
            config_version = 1

            [rules]
            first_hour = 8
            unique_session_days = false

            [host]
            tick_millis = 250

            [[classrooms]]
            id = "lab-1"
            label = "Chemistry Lab"
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.rules.first_hour, Some(8));
        assert_eq!(config.rules.last_hour, None);
        assert_eq!(config.rules.unique_session_days, Some(false));
        assert_eq!(config.host.tick_millis, Some(250));
        assert!(!config.host.strict_occurrences);
        assert_eq!(config.classrooms[0].id, RawKey::Text("lab-1".into()));
        assert!(config.schedules.is_empty());
    }
}
