//! Interval engine implementation.
//!
//! The interval engine is a tick-driven state machine. It does not use
//! internal threads or read the clock - the caller measures the real time
//! between ticks and passes it to `tick()`.
//!
//! ## State Transitions
//!
//! ```text
//! Working --(work_seconds)--> ShortResting --(short_rest_seconds)--> Working
//!    |
//!    +--(every Nth pomodoro)--> LongResting --(long_rest_seconds)--> Working
//! ```
//!
//! While Working, the engine can additionally be paused for inactivity.
//! Paused time is never credited. Rest time accrues regardless of input.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = IntervalEngine::new(settings);
//! // Once per second:
//! for event in engine.tick(elapsed) { /* notify, flush */ }
//! ```

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::activity::InputKind;
use crate::events::Event;
use crate::storage::Settings;

const MINUTE_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Working,
    ShortResting,
    LongResting,
}

impl Phase {
    pub fn is_resting(self) -> bool {
        !matches!(self, Phase::Working)
    }
}

/// Mutable interval state, owned by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalState {
    pub phase: Phase,
    /// Time accrued in the current phase. Resets on every transition.
    pub elapsed_in_phase_ms: u64,
    pub completed_pomodoros: u32,
    pub total_work_minutes: u64,
    pub total_rest_minutes: u64,
    /// Working is on hold because the user went idle.
    pub paused: bool,
}

impl Default for IntervalState {
    fn default() -> Self {
        Self {
            phase: Phase::Working,
            elapsed_in_phase_ms: 0,
            completed_pomodoros: 0,
            total_work_minutes: 0,
            total_rest_minutes: 0,
            paused: false,
        }
    }
}

/// Core work/rest state machine.
#[derive(Debug, Clone)]
pub struct IntervalEngine {
    settings: Settings,
    state: IntervalState,
    stopped: bool,
}

impl IntervalEngine {
    /// Create an engine in the Working phase with every counter at zero.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            state: IntervalState::default(),
            stopped: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &IntervalState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn elapsed_in_phase(&self) -> Duration {
        Duration::from_millis(self.state.elapsed_in_phase_ms)
    }

    /// Configured length of the current phase.
    pub fn phase_duration(&self) -> Duration {
        Duration::from_secs(self.phase_duration_secs(self.state.phase))
    }

    fn phase_duration_secs(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Working => self.settings.work_seconds,
            Phase::ShortResting => self.settings.short_rest_seconds,
            Phase::LongResting => self.settings.long_rest_seconds,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// The user has been idle beyond the inactivity limit.
    ///
    /// Pauses a Working phase once. Returns `None` while resting, when
    /// already paused, or after stop.
    pub fn pause_for_inactivity(&mut self) -> Option<Event> {
        if self.stopped || self.state.phase != Phase::Working || self.state.paused {
            return None;
        }
        self.state.paused = true;
        tracing::info!(
            elapsed_ms = self.state.elapsed_in_phase_ms,
            "pausing work phase for inactivity"
        );
        Some(Event::PausedForInactivity {
            limit_secs: self.settings.inactivity_limit_seconds,
            at: Utc::now(),
        })
    }

    /// Input arrived. Clears an inactivity pause if Working.
    pub fn resume_from_activity(&mut self, source: Option<InputKind>) -> Option<Event> {
        if self.stopped || self.state.phase != Phase::Working || !self.state.paused {
            return None;
        }
        self.state.paused = false;
        tracing::info!(?source, "resuming work phase");
        Some(Event::Resumed {
            source,
            at: Utc::now(),
        })
    }

    /// Advance by `elapsed` of real time.
    ///
    /// Minute-boundary accounting happens before a phase transition that
    /// lands in the same tick. Returns the events produced, in order.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        if self.stopped {
            return events;
        }
        let phase = self.state.phase;
        if phase == Phase::Working && self.state.paused {
            return events;
        }

        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let before = self.state.elapsed_in_phase_ms;
        let after = before.saturating_add(elapsed_ms);
        self.state.elapsed_in_phase_ms = after;

        let threshold_ms = self.phase_duration_secs(phase).saturating_mul(1000);
        let minutes_crossed = after / MINUTE_MS - before / MINUTE_MS;
        if minutes_crossed > 0 {
            match phase {
                Phase::Working => self.state.total_work_minutes += minutes_crossed,
                Phase::ShortResting | Phase::LongResting => {
                    self.state.total_rest_minutes += minutes_crossed
                }
            }
            // A minute that coincides with the end of the phase is announced
            // by the transition instead.
            if after < threshold_ms {
                events.push(match phase {
                    Phase::Working => Event::WorkProgress {
                        total_minutes: self.state.total_work_minutes,
                        at: Utc::now(),
                    },
                    Phase::ShortResting | Phase::LongResting => Event::RestProgress {
                        minutes_in_phase: after / MINUTE_MS,
                        at: Utc::now(),
                    },
                });
            }
        }

        if after >= threshold_ms {
            match phase {
                Phase::Working => self.complete_pomodoro(&mut events),
                Phase::ShortResting | Phase::LongResting => self.finish_rest(&mut events),
            }
        }

        events
    }

    /// End the session.
    ///
    /// Returns the work time accrued in the current Working phase that has
    /// not been flushed yet. Returns `None` when resting or when already
    /// stopped; a stopped engine ignores every further command.
    pub fn stop(&mut self) -> Option<Duration> {
        if self.stopped {
            return None;
        }
        self.stopped = true;
        match self.state.phase {
            Phase::Working => Some(self.elapsed_in_phase()),
            Phase::ShortResting | Phase::LongResting => None,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_pomodoro(&mut self, events: &mut Vec<Event>) {
        self.state.completed_pomodoros += 1;
        let count = self.state.completed_pomodoros;
        let next = if count % self.settings.pomodoros_before_long_rest.max(1) == 0 {
            Phase::LongResting
        } else {
            Phase::ShortResting
        };
        self.enter(next);
        tracing::info!(count, ?next, "pomodoro complete");

        events.push(Event::PomodoroCompleted {
            count,
            work_secs: self.settings.work_seconds,
            at: Utc::now(),
        });
        events.push(Event::RestStarted {
            phase: next,
            duration_secs: self.phase_duration_secs(next),
            at: Utc::now(),
        });
    }

    fn finish_rest(&mut self, events: &mut Vec<Event>) {
        let finished = self.state.phase;
        self.enter(Phase::Working);
        tracing::info!(?finished, "rest finished");
        events.push(Event::RestFinished {
            phase: finished,
            at: Utc::now(),
        });
    }

    fn enter(&mut self, phase: Phase) {
        self.state.phase = phase;
        self.state.elapsed_in_phase_ms = 0;
        self.state.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    fn quick_settings() -> Settings {
        Settings {
            work_seconds: 5,
            short_rest_seconds: 5,
            long_rest_seconds: 15,
            pomodoros_before_long_rest: 4,
            inactivity_limit_seconds: 90,
        }
    }

    fn run_ticks(engine: &mut IntervalEngine, n: usize) -> Vec<Event> {
        (0..n).flat_map(|_| engine.tick(SECOND)).collect()
    }

    #[test]
    fn starts_working_with_zero_counters() {
        let engine = IntervalEngine::new(quick_settings());
        assert_eq!(engine.state(), &IntervalState::default());
        assert_eq!(engine.phase(), Phase::Working);
        assert!(!engine.is_paused());
    }

    #[test]
    fn work_phase_ends_exactly_at_threshold() {
        let mut engine = IntervalEngine::new(quick_settings());
        assert!(run_ticks(&mut engine, 4).is_empty());
        assert_eq!(engine.phase(), Phase::Working);
        assert_eq!(engine.elapsed_in_phase(), Duration::from_secs(4));

        let events = engine.tick(SECOND);
        assert_eq!(engine.phase(), Phase::ShortResting);
        assert_eq!(engine.state().completed_pomodoros, 1);
        assert_eq!(engine.elapsed_in_phase(), Duration::ZERO);
        assert!(matches!(events[0], Event::PomodoroCompleted { count: 1, work_secs: 5, .. }));
        assert!(matches!(
            events[1],
            Event::RestStarted { phase: Phase::ShortResting, duration_secs: 5, .. }
        ));
    }

    #[test]
    fn every_fourth_pomodoro_takes_a_long_rest() {
        let mut engine = IntervalEngine::new(quick_settings());
        let mut rests = Vec::new();
        for _ in 0..8 {
            run_ticks(&mut engine, 5);
            rests.push(engine.phase());
            let rest_secs = engine.phase_duration().as_secs() as usize;
            run_ticks(&mut engine, rest_secs);
            assert_eq!(engine.phase(), Phase::Working);
        }
        use Phase::*;
        assert_eq!(
            rests,
            vec![
                ShortResting, ShortResting, ShortResting, LongResting,
                ShortResting, ShortResting, ShortResting, LongResting,
            ]
        );
        assert_eq!(engine.state().completed_pomodoros, 8);
    }

    #[test]
    fn rest_finishes_back_to_work() {
        let mut engine = IntervalEngine::new(quick_settings());
        run_ticks(&mut engine, 5);
        let events = run_ticks(&mut engine, 5);
        assert_eq!(engine.phase(), Phase::Working);
        assert!(matches!(
            events.last(),
            Some(Event::RestFinished { phase: Phase::ShortResting, .. })
        ));
    }

    #[test]
    fn paused_work_does_not_accrue() {
        let mut engine = IntervalEngine::new(quick_settings());
        engine.tick(SECOND);
        assert!(engine.pause_for_inactivity().is_some());
        assert!(run_ticks(&mut engine, 100).is_empty());
        assert_eq!(engine.elapsed_in_phase(), SECOND);
        assert_eq!(engine.phase(), Phase::Working);
    }

    #[test]
    fn pause_is_reported_once() {
        let mut engine = IntervalEngine::new(quick_settings());
        assert!(engine.pause_for_inactivity().is_some());
        assert!(engine.pause_for_inactivity().is_none());
        assert!(engine.pause_for_inactivity().is_none());
        assert!(engine.is_paused());
    }

    #[test]
    fn resume_does_not_credit_paused_time() {
        let mut engine = IntervalEngine::new(quick_settings());
        engine.tick(SECOND);
        engine.pause_for_inactivity();
        run_ticks(&mut engine, 30);
        assert!(engine.resume_from_activity(Some(InputKind::Pointer)).is_some());
        assert!(engine.resume_from_activity(None).is_none());
        engine.tick(SECOND);
        assert_eq!(engine.elapsed_in_phase(), Duration::from_secs(2));
    }

    #[test]
    fn rest_ignores_inactivity() {
        let mut engine = IntervalEngine::new(quick_settings());
        run_ticks(&mut engine, 5);
        assert!(engine.phase().is_resting());
        assert!(engine.pause_for_inactivity().is_none());
        engine.tick(SECOND);
        assert_eq!(engine.elapsed_in_phase(), SECOND);
    }

    #[test]
    fn transition_clears_pause_flag() {
        let mut engine = IntervalEngine::new(quick_settings());
        run_ticks(&mut engine, 4);
        engine.pause_for_inactivity();
        engine.resume_from_activity(None);
        engine.tick(SECOND);
        assert_eq!(engine.phase(), Phase::ShortResting);
        assert!(!engine.is_paused());
    }

    #[test]
    fn minute_progress_is_reported_once_per_boundary() {
        let settings = Settings {
            work_seconds: 150,
            ..quick_settings()
        };
        let mut engine = IntervalEngine::new(settings);
        let events = run_ticks(&mut engine, 130);
        let progress: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::WorkProgress { total_minutes, .. } => Some(*total_minutes),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![1, 2]);
        assert_eq!(engine.state().total_work_minutes, 2);
    }

    #[test]
    fn minute_and_transition_in_same_tick() {
        let settings = Settings {
            work_seconds: 60,
            ..quick_settings()
        };
        let mut engine = IntervalEngine::new(settings);
        run_ticks(&mut engine, 59);
        let events = engine.tick(SECOND);
        assert_eq!(engine.state().total_work_minutes, 1);
        assert_eq!(engine.phase(), Phase::ShortResting);
        assert!(matches!(events[0], Event::PomodoroCompleted { .. }));
        assert!(!events.iter().any(|e| matches!(e, Event::WorkProgress { .. })));
    }

    #[test]
    fn long_gap_counts_every_minute() {
        let settings = Settings {
            work_seconds: 3600,
            ..quick_settings()
        };
        let mut engine = IntervalEngine::new(settings);
        engine.tick(Duration::from_secs(185));
        assert_eq!(engine.state().total_work_minutes, 3);
    }

    #[test]
    fn rest_minutes_accumulate_separately() {
        let settings = Settings {
            work_seconds: 5,
            short_rest_seconds: 180,
            ..quick_settings()
        };
        let mut engine = IntervalEngine::new(settings);
        run_ticks(&mut engine, 5);
        let events = run_ticks(&mut engine, 120);
        assert_eq!(engine.state().total_rest_minutes, 2);
        assert_eq!(engine.state().total_work_minutes, 0);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::RestProgress { minutes_in_phase: 2, .. })));
    }

    #[test]
    fn stop_returns_unflushed_work_once() {
        let mut engine = IntervalEngine::new(quick_settings());
        run_ticks(&mut engine, 3);
        assert_eq!(engine.stop(), Some(Duration::from_secs(3)));
        assert_eq!(engine.stop(), None);
        assert!(engine.tick(SECOND).is_empty());
        assert!(engine.pause_for_inactivity().is_none());
    }

    #[test]
    fn stop_while_resting_flushes_nothing() {
        let mut engine = IntervalEngine::new(quick_settings());
        run_ticks(&mut engine, 7);
        assert!(engine.phase().is_resting());
        assert_eq!(engine.stop(), None);
    }
}
