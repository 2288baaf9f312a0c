//! User-activity tracking.
//!
//! Input listeners call [`ActivityMonitor::record_activity`] from their own
//! threads; the inactivity watchdog and the tick driver read it. The last
//! activity time is a single atomic, so there is no lock between the
//! listeners and the readers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crossbeam_channel::{Sender, TrySendError};
use serde::{Deserialize, Serialize};

/// Source of monotonic time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Used to drive sessions
/// deterministically.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        self.origin + offset
    }
}

/// What kind of input woke the user up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Pointer,
    Keyboard,
    /// A line typed into the session's terminal.
    Terminal,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputKind::Pointer => "mouse",
            InputKind::Keyboard => "keyboard",
            InputKind::Terminal => "terminal",
        };
        f.write_str(name)
    }
}

/// Tracks time since the last detected user input.
pub struct ActivityMonitor {
    clock: Arc<dyn Clock>,
    origin: Instant,
    /// Milliseconds after `origin` of the most recent input.
    last_activity_ms: AtomicU64,
    signal: Option<Sender<InputKind>>,
}

impl ActivityMonitor {
    /// Start a monitor that treats "now" as the last activity.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let origin = clock.now();
        Self {
            clock,
            origin,
            last_activity_ms: AtomicU64::new(0),
            signal: None,
        }
    }

    /// Post every recorded activity to `signal` as well. Use a bounded
    /// channel: when it is full a wake-up is already pending and the new one
    /// is dropped.
    pub fn with_signal(mut self, signal: Sender<InputKind>) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Called on every detected input event.
    ///
    /// Updates the activity timestamp and posts a wake-up for the tick
    /// driver, which clears an inactivity pause at its next tick.
    pub fn record_activity(&self, kind: InputKind) {
        self.touch();
        if let Some(signal) = &self.signal {
            match signal.try_send(kind) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => {
                    tracing::trace!(%kind, "activity signal receiver is gone");
                }
            }
        }
    }

    /// Reset the activity timestamp without waking anyone.
    pub fn touch(&self) {
        let now_ms = self.millis_since_origin(self.clock.now());
        self.last_activity_ms.fetch_max(now_ms, Ordering::AcqRel);
    }

    /// Time since the last recorded activity.
    pub fn idle_for(&self) -> Duration {
        let now_ms = self.millis_since_origin(self.clock.now());
        let last_ms = self.last_activity_ms.load(Ordering::Acquire);
        Duration::from_millis(now_ms.saturating_sub(last_ms))
    }

    /// `true` when more than `threshold_secs` have passed since the last
    /// activity.
    pub fn is_inactive_beyond(&self, threshold_secs: u64) -> bool {
        self.idle_for() > Duration::from_secs(threshold_secs)
    }

    fn millis_since_origin(&self, at: Instant) -> u64 {
        u64::try_from(at.saturating_duration_since(self.origin).as_millis()).unwrap_or(u64::MAX)
    }
}

impl fmt::Debug for ActivityMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityMonitor")
            .field("idle_for", &self.idle_for())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn monitor() -> (Arc<ManualClock>, ActivityMonitor) {
        let clock = Arc::new(ManualClock::new());
        let monitor = ActivityMonitor::new(clock.clone());
        (clock, monitor)
    }

    #[test]
    fn fresh_monitor_is_active() {
        let (_clock, monitor) = monitor();
        assert_eq!(monitor.idle_for(), Duration::ZERO);
        assert!(!monitor.is_inactive_beyond(0));
    }

    #[test]
    fn inactivity_threshold_is_strict() {
        let (clock, monitor) = monitor();
        clock.advance(Duration::from_secs(90));
        assert!(!monitor.is_inactive_beyond(90));
        clock.advance(Duration::from_millis(1));
        assert!(monitor.is_inactive_beyond(90));
    }

    #[test]
    fn activity_resets_idle_time() {
        let (clock, monitor) = monitor();
        clock.advance(Duration::from_secs(120));
        monitor.record_activity(InputKind::Keyboard);
        assert_eq!(monitor.idle_for(), Duration::ZERO);
        clock.advance(Duration::from_secs(5));
        assert_eq!(monitor.idle_for(), Duration::from_secs(5));
    }

    #[test]
    fn activity_signal_coalesces() {
        let (tx, rx) = bounded(1);
        let clock = Arc::new(ManualClock::new());
        let monitor = ActivityMonitor::new(clock).with_signal(tx);

        monitor.record_activity(InputKind::Pointer);
        monitor.record_activity(InputKind::Pointer);
        monitor.record_activity(InputKind::Keyboard);

        assert_eq!(rx.try_recv(), Ok(InputKind::Pointer));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn touch_does_not_signal() {
        let (tx, rx) = bounded(1);
        let clock = Arc::new(ManualClock::new());
        let monitor = ActivityMonitor::new(clock.clone()).with_signal(tx);
        clock.advance(Duration::from_secs(30));
        monitor.touch();
        assert_eq!(monitor.idle_for(), Duration::ZERO);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let monitor = Arc::new(ActivityMonitor::new(clock));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let monitor = Arc::clone(&monitor);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        monitor.record_activity(InputKind::Pointer);
                        let _ = monitor.is_inactive_beyond(90);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(!monitor.is_inactive_beyond(90));
    }
}
