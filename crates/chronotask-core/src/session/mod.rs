//! One work session on one task.
//!
//! [`Session`] binds the interval engine to its side effects: it forwards
//! every event to the notifier, flushes work minutes into the task ledger on
//! pomodoro completion and on stop, and keeps the session log. It is driven
//! from a single thread; [`SessionController`] supplies that thread and the
//! concurrent listeners around it.

mod controller;
mod input;
mod log;

pub use controller::{SessionController, StopHandle};
pub use input::{InputSource, QuitReader};
#[cfg(feature = "input-hooks")]
pub use input::GlobalInputHook;
pub use log::SessionLog;

use std::time::Duration;

use chrono::{Local, NaiveDateTime, SubsecRound, Utc};

use crate::error::Result;
use crate::events::Event;
use crate::notify::Notifier;
use crate::storage::Settings;
use crate::task::{round_minutes, WorkLedger};
use crate::timer::{InputKind, IntervalEngine};

/// What a session achieved, written to the session log on stop.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub task_id: String,
    pub started_at: NaiveDateTime,
    pub stopped_at: NaiveDateTime,
    pub pomodoros: u32,
    pub total_work_minutes: u64,
    pub total_rest_minutes: u64,
    /// Minutes flushed by the stop itself (the unfinished work phase).
    pub final_flush_minutes: f64,
}

pub struct Session<L: WorkLedger, N: Notifier> {
    task_id: String,
    engine: IntervalEngine,
    ledger: L,
    notifier: N,
    log: SessionLog,
    started_at: NaiveDateTime,
    summary: Option<SessionSummary>,
}

impl<L: WorkLedger, N: Notifier> Session<L, N> {
    /// Start working on `task_id`.
    ///
    /// Writes the start line to the session log and opens a history session
    /// on the task.
    ///
    /// # Errors
    /// Fails if the settings are invalid, the task does not exist, or the
    /// log or ledger cannot be written.
    pub fn begin(
        task_id: impl Into<String>,
        settings: Settings,
        mut ledger: L,
        notifier: N,
        log: SessionLog,
    ) -> Result<Self> {
        let task_id = task_id.into();
        settings.validate()?;
        ledger.load_task_by_id(&task_id)?;

        let started_at = now_local();
        log.record_start(started_at)?;
        ledger.append_history_session(&task_id, started_at)?;
        ledger.commit()?;

        tracing::info!(task_id = %task_id, "session started");
        notifier.notify(&Event::SessionStarted {
            task_id: task_id.clone(),
            at: Utc::now(),
        });

        Ok(Self {
            task_id,
            engine: IntervalEngine::new(settings),
            ledger,
            notifier,
            log,
            started_at,
            summary: None,
        })
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn engine(&self) -> &IntervalEngine {
        &self.engine
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn into_ledger(self) -> L {
        self.ledger
    }

    /// The user has been idle beyond the limit.
    pub fn on_inactivity(&mut self) -> Option<Event> {
        let event = self.engine.pause_for_inactivity()?;
        self.notifier.notify(&event);
        Some(event)
    }

    /// Input arrived since the last tick.
    pub fn on_activity(&mut self, source: Option<InputKind>) -> Option<Event> {
        let event = self.engine.resume_from_activity(source)?;
        self.notifier.notify(&event);
        Some(event)
    }

    /// Advance the engine and carry out the side effects of its events.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<Event> {
        let events = self.engine.tick(elapsed);
        for event in &events {
            self.notifier.notify(event);
            match event {
                Event::PomodoroCompleted { work_secs, .. } => {
                    self.flush(Duration::from_secs(*work_secs));
                    self.commit_absorbing();
                }
                Event::RestFinished { .. } => self.open_history_session(),
                Event::WorkProgress { total_minutes, .. } => {
                    tracing::debug!(total_minutes, "work minute");
                }
                _ => {}
            }
        }
        events
    }

    /// Stop the session: flush the unfinished work phase, commit the ledger
    /// and append the summary to the session log.
    ///
    /// Calling it again returns the same summary without touching the ledger.
    ///
    /// # Errors
    /// Fails only if the ledger cannot be committed. The flush itself is not
    /// repeated on a retry.
    pub fn request_stop(&mut self) -> Result<SessionSummary> {
        if let Some(summary) = &self.summary {
            return Ok(summary.clone());
        }

        let final_flush_minutes = match self.engine.stop() {
            Some(unflushed) => self.flush(unflushed),
            None => {
                tracing::debug!(phase = ?self.engine.phase(), "stopped outside a work phase");
                0.0
            }
        };
        self.ledger.commit()?;

        let state = self.engine.state();
        let summary = SessionSummary {
            task_id: self.task_id.clone(),
            started_at: self.started_at,
            stopped_at: now_local(),
            pomodoros: state.completed_pomodoros,
            total_work_minutes: state.total_work_minutes,
            total_rest_minutes: state.total_rest_minutes,
            final_flush_minutes,
        };
        if let Err(e) = self.log.record_summary(&summary) {
            tracing::warn!(error = %e, path = %self.log.path().display(), "could not write session summary");
        }
        self.notifier.notify(&Event::SessionStopped {
            pomodoros: summary.pomodoros,
            total_work_minutes: summary.total_work_minutes,
            total_rest_minutes: summary.total_rest_minutes,
            at: Utc::now(),
        });
        tracing::info!(task_id = %self.task_id, pomodoros = summary.pomodoros, "session stopped");

        self.summary = Some(summary.clone());
        Ok(summary)
    }

    /// Credit `span` of work to the task. Missing records are logged and
    /// skipped. Returns the minutes credited.
    fn flush(&mut self, span: Duration) -> f64 {
        let minutes = round_minutes(span);
        let stop = now_local();
        if let Err(e) = self.ledger.finalize_open_session(&self.task_id, stop, minutes) {
            tracing::warn!(task_id = %self.task_id, error = %e, "no history session to finalize");
        }
        if let Err(e) = self.ledger.add_total_work(&self.task_id, minutes) {
            tracing::warn!(task_id = %self.task_id, error = %e, "could not add work time");
        }
        tracing::info!(task_id = %self.task_id, minutes, "flushed work time");
        minutes
    }

    fn open_history_session(&mut self) {
        if let Err(e) = self.ledger.append_history_session(&self.task_id, now_local()) {
            tracing::warn!(task_id = %self.task_id, error = %e, "could not open history session");
        }
        self.commit_absorbing();
    }

    fn commit_absorbing(&mut self) {
        if let Err(e) = self.ledger.commit() {
            tracing::warn!(error = %e, "could not save task store, will retry at next flush");
        }
    }
}

fn now_local() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}
