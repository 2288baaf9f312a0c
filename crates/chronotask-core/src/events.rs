use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{InputKind, Phase};

/// Every observable change in a running session produces an Event.
/// Notification sinks render them; the session reacts to boundary events by
/// flushing work time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        task_id: String,
        at: DateTime<Utc>,
    },
    /// A Working phase reached its full duration.
    PomodoroCompleted {
        count: u32,
        work_secs: u64,
        at: DateTime<Utc>,
    },
    RestStarted {
        phase: Phase,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    RestFinished {
        phase: Phase,
        at: DateTime<Utc>,
    },
    PausedForInactivity {
        limit_secs: u64,
        at: DateTime<Utc>,
    },
    Resumed {
        source: Option<InputKind>,
        at: DateTime<Utc>,
    },
    /// Another full minute of work; `total_minutes` counts the whole session.
    WorkProgress {
        total_minutes: u64,
        at: DateTime<Utc>,
    },
    /// Another full minute of the current rest.
    RestProgress {
        minutes_in_phase: u64,
        at: DateTime<Utc>,
    },
    SessionStopped {
        pomodoros: u32,
        total_work_minutes: u64,
        total_rest_minutes: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Human-readable line for terminals and desktop notifications.
    pub fn message(&self) -> String {
        match self {
            Event::SessionStarted { task_id, .. } => format!("Work started on task {task_id}."),
            Event::PomodoroCompleted { count, .. } => {
                format!("Pomodoro #{count} complete! Time for a break.")
            }
            Event::RestStarted { phase, duration_secs, .. } => {
                let kind = if *phase == Phase::LongResting { "Long" } else { "Short" };
                format!("{kind} rest for {} minutes.", duration_secs / 60)
            }
            Event::RestFinished { .. } => "Rest finished! Time for work.".to_string(),
            Event::PausedForInactivity { limit_secs, at } => format!(
                "No activity for {limit_secs} seconds, pausing timer {}",
                at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
            ),
            Event::Resumed { source, .. } => match source {
                Some(kind) => format!("Resuming timer due to {kind} activity."),
                None => "Resuming timer due to activity.".to_string(),
            },
            Event::WorkProgress { total_minutes, .. } => {
                format!("Active for {total_minutes} minute(s).")
            }
            Event::RestProgress { minutes_in_phase, .. } => {
                format!("Resting for {minutes_in_phase} minute(s).")
            }
            Event::SessionStopped {
                pomodoros,
                total_work_minutes,
                total_rest_minutes,
                ..
            } => format!(
                "Session stopped: {pomodoros} pomodoro(s), {total_work_minutes} work minute(s), {total_rest_minutes} rest minute(s)."
            ),
        }
    }

    /// Phase boundaries deserve a desktop notification and a sound; the
    /// rest is terminal chatter.
    pub fn is_alert(&self) -> bool {
        matches!(
            self,
            Event::PomodoroCompleted { .. } | Event::RestFinished { .. }
        )
    }
}
