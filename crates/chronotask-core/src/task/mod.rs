//! Task records and their work history.
//!
//! A task accumulates work minutes in `total_work` and keeps one history
//! entry per Working phase, grouped by the calendar date the phase started.

mod store;

pub use store::{StatusFilter, TaskStore, WorkLedger};

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Active,
    Done,
    Dismissed,
}

impl TaskStatus {
    /// Checkbox shown in task listings.
    pub fn checkbox(self) -> &'static str {
        match self {
            TaskStatus::Active => "[ ]",
            TaskStatus::Done => "[x]",
            TaskStatus::Dismissed => "[-]",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskStatus::Active => "active",
            TaskStatus::Done => "done",
            TaskStatus::Dismissed => "dismissed",
        };
        f.write_str(name)
    }
}

/// One stretch of work on a task. `stop` is `None` while the session is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSession {
    #[serde(with = "timestamp")]
    pub start: NaiveDateTime,
    #[serde(with = "timestamp::option")]
    pub stop: Option<NaiveDateTime>,
    pub minutes: f64,
}

impl WorkSession {
    pub fn is_open(&self) -> bool {
        self.stop.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub text: String,
    /// Due date.
    pub date: NaiveDate,
    pub project: Option<String>,
    pub tag: Option<String>,
    pub value: Option<String>,
    pub global_id: String,
    #[serde(with = "timestamp")]
    pub date_added: NaiveDateTime,
    #[serde(default, with = "timestamp::option")]
    pub date_done: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp::option")]
    pub date_dismissed: Option<NaiveDateTime>,
    pub status: TaskStatus,
    /// Total minutes of work.
    #[serde(default)]
    pub total_work: f64,
    #[serde(default)]
    pub history: BTreeMap<NaiveDate, Vec<WorkSession>>,
}

impl TaskRecord {
    /// The open history session, if any.
    pub fn open_session(&self) -> Option<&WorkSession> {
        self.history.values().flatten().rev().find(|s| s.is_open())
    }

    pub(crate) fn open_session_mut(&mut self) -> Option<&mut WorkSession> {
        self.history
            .values_mut()
            .rev()
            .flat_map(|sessions| sessions.iter_mut().rev())
            .find(|s| s.is_open())
    }

    /// Minutes recorded in history for `day`.
    pub fn minutes_on(&self, day: NaiveDate) -> f64 {
        self.history
            .get(&day)
            .map(|sessions| sessions.iter().map(|s| s.minutes).sum())
            .unwrap_or(0.0)
    }
}

/// Fields for a task being created.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub text: String,
    pub date: Option<NaiveDate>,
    pub project: Option<String>,
    pub tag: Option<String>,
    pub value: Option<String>,
}

/// Partial update; only `Some` fields change.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub date: Option<NaiveDate>,
    pub project: Option<String>,
    pub tag: Option<String>,
    pub value: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.date.is_none()
            && self.project.is_none()
            && self.tag.is_none()
            && self.value.is_none()
    }
}

/// Convert a span of work into stored minutes, rounded half away from zero
/// to two decimals: 5s -> 0.08, 3s -> 0.05, 1500s -> 25.0.
pub fn round_minutes(span: Duration) -> f64 {
    round_hundredths(span.as_secs_f64() / 60.0)
}

pub(crate) fn round_hundredths(minutes: f64) -> f64 {
    (minutes * 100.0).round() / 100.0
}

/// `YYYY-MM-DD HH:MM:SS` local timestamps.
mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::FORMAT;
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDateTime>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => s.collect_str(&v.format(FORMAT)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|raw| NaiveDateTime::parse_from_str(&raw, FORMAT))
                .transpose()
                .map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn rounding_examples() {
        assert_eq!(round_minutes(Duration::from_secs(5)), 0.08);
        assert_eq!(round_minutes(Duration::from_secs(3)), 0.05);
        assert_eq!(round_minutes(Duration::from_secs(1500)), 25.0);
        assert_eq!(round_minutes(Duration::ZERO), 0.0);
        // 0.125 minutes rounds away from zero.
        assert_eq!(round_minutes(Duration::from_millis(7_500)), 0.13);
    }

    #[test]
    fn record_json_shape() {
        let mut history = BTreeMap::new();
        history.insert(
            NaiveDate::from_ymd_opt(2024, 10, 3).unwrap(),
            vec![WorkSession {
                start: at("2024-10-03 09:00:00"),
                stop: None,
                minutes: 0.0,
            }],
        );
        let record = TaskRecord {
            text: "write report".into(),
            date: NaiveDate::from_ymd_opt(2024, 10, 4).unwrap(),
            project: None,
            tag: Some("work".into()),
            value: None,
            global_id: "abc".into(),
            date_added: at("2024-10-01 12:30:00"),
            date_done: None,
            date_dismissed: None,
            status: TaskStatus::Active,
            total_work: 12.5,
            history,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2024-10-04");
        assert_eq!(json["date_added"], "2024-10-01 12:30:00");
        assert_eq!(json["status"], "active");
        assert_eq!(json["history"]["2024-10-03"][0]["start"], "2024-10-03 09:00:00");
        assert!(json["history"]["2024-10-03"][0]["stop"].is_null());

        let back: TaskRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn open_session_is_latest_unfinished() {
        let day = NaiveDate::from_ymd_opt(2024, 10, 3).unwrap();
        let mut history = BTreeMap::new();
        history.insert(
            day,
            vec![
                WorkSession {
                    start: at("2024-10-03 09:00:00"),
                    stop: Some(at("2024-10-03 09:25:00")),
                    minutes: 25.0,
                },
                WorkSession {
                    start: at("2024-10-03 09:30:00"),
                    stop: None,
                    minutes: 0.0,
                },
            ],
        );
        let record = TaskRecord {
            text: String::new(),
            date: day,
            project: None,
            tag: None,
            value: None,
            global_id: "id".into(),
            date_added: at("2024-10-03 08:00:00"),
            date_done: None,
            date_dismissed: None,
            status: TaskStatus::Active,
            total_work: 25.0,
            history,
        };
        assert_eq!(record.open_session().unwrap().start, at("2024-10-03 09:30:00"));
        assert_eq!(record.minutes_on(day), 25.0);
    }
}
