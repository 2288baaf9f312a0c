//! Threads around a running [`Session`].
//!
//! The tick driver runs on the caller's thread and owns the session. Input
//! sources and the inactivity watchdog run on their own threads and only
//! talk to it through the activity monitor and the control channel, so the
//! engine is never touched concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, unbounded, Receiver, Sender};

use super::{InputSource, Session, SessionSummary};
use crate::error::Result;
use crate::events::Event;
use crate::notify::Notifier;
use crate::storage::Settings;
use crate::task::WorkLedger;
use crate::timer::{ActivityMonitor, Clock, InputKind, SystemClock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    /// The watchdog saw an idle stretch beyond the limit.
    Inactive,
    Stop,
}

/// Shared stop request. Cloned into every thread of a session.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
    control: Sender<Control>,
}

impl StopHandle {
    /// Ask the session to stop. Safe to call from any thread, any number of
    /// times.
    pub fn request_stop(&self) {
        if !self.flag.swap(true, Ordering::AcqRel) {
            tracing::info!("stop requested");
            // The driver also polls the flag, so a full or closed channel is fine.
            let _ = self.control.try_send(Control::Stop);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Runs one session to completion. Build a new controller per session.
pub struct SessionController {
    settings: Settings,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
    poll_interval: Duration,
    stop: StopHandle,
    control_rx: Receiver<Control>,
}

impl SessionController {
    pub fn new(settings: Settings) -> Self {
        let (control_tx, control_rx) = unbounded();
        Self {
            settings,
            clock: Arc::new(SystemClock),
            tick_interval: Duration::from_secs(1),
            poll_interval: Duration::from_secs(1),
            stop: StopHandle {
                flag: Arc::new(AtomicBool::new(false)),
                control: control_tx,
            },
            control_rx,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// How often the driver ticks the engine and the watchdog polls for
    /// inactivity. One second by default.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self.poll_interval = interval;
        self
    }

    /// A handle that stops the session when `run` is in progress.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Drive `session` until a stop is requested, then flush it.
    ///
    /// Each source runs on a detached thread. Sources blocked in a read may
    /// outlive the call; they see the stop flag and exit on their next event.
    ///
    /// # Errors
    /// Fails if a thread cannot be spawned or the final flush cannot be
    /// committed.
    pub fn run<L: WorkLedger, N: Notifier>(
        self,
        session: &mut Session<L, N>,
        sources: Vec<Box<dyn InputSource>>,
    ) -> Result<SessionSummary> {
        let (activity_tx, activity_rx) = bounded(1);
        let monitor = Arc::new(ActivityMonitor::new(self.clock.clone()).with_signal(activity_tx));

        for source in sources {
            let name = source.name().to_string();
            let monitor = Arc::clone(&monitor);
            let stop = self.stop.clone();
            let spawned = thread::Builder::new()
                .name(name.clone())
                .spawn(move || source.run(monitor, stop));
            if let Err(e) = spawned {
                self.stop.request_stop();
                tracing::error!(source = %name, error = %e, "could not start input source");
                session.request_stop()?;
                return Err(e.into());
            }
        }

        let watchdog = match self.spawn_watchdog(Arc::clone(&monitor)) {
            Ok(handle) => handle,
            Err(e) => {
                self.stop.request_stop();
                session.request_stop()?;
                return Err(e.into());
            }
        };

        self.drive(session, &monitor, &activity_rx);

        self.stop.request_stop();
        let summary = session.request_stop();
        if watchdog.join().is_err() {
            tracing::warn!("inactivity watchdog panicked");
        }
        summary
    }

    fn drive<L: WorkLedger, N: Notifier>(
        &self,
        session: &mut Session<L, N>,
        monitor: &ActivityMonitor,
        activity_rx: &Receiver<InputKind>,
    ) {
        let ticker = tick(self.tick_interval);
        let limit = self.settings.inactivity_limit_seconds;
        let mut last = self.clock.now();
        let mut idle_reported = false;
        let mut pending_activity: Option<InputKind> = None;
        let mut finished = false;

        while !finished && !self.stop.is_stopped() {
            select! {
                recv(ticker) -> _ => {
                    // Re-check: input may have arrived after the report.
                    if std::mem::take(&mut idle_reported) && monitor.is_inactive_beyond(limit) {
                        session.on_inactivity();
                    }
                    if let Some(kind) = pending_activity.take() {
                        session.on_activity(Some(kind));
                    }

                    let now = self.clock.now();
                    let elapsed = now.saturating_duration_since(last);
                    last = now;
                    let events = session.tick(elapsed);
                    if events.iter().any(|e| matches!(e, Event::RestFinished { .. })) {
                        // Idle time spent resting does not count against the next work phase.
                        monitor.touch();
                    }
                }
                recv(activity_rx) -> kind => {
                    if let Ok(kind) = kind {
                        pending_activity = Some(kind);
                    }
                }
                recv(self.control_rx) -> control => match control {
                    Ok(Control::Inactive) => idle_reported = true,
                    Ok(Control::Stop) | Err(_) => finished = true,
                },
            }
        }
        tracing::debug!("tick driver finished");
    }

    fn spawn_watchdog(&self, monitor: Arc<ActivityMonitor>) -> std::io::Result<JoinHandle<()>> {
        let stop = self.stop.clone();
        let mut watchdog = Watchdog::new(self.settings.inactivity_limit_seconds);
        let poll = self.poll_interval;
        thread::Builder::new()
            .name("inactivity-watchdog".into())
            .spawn(move || {
                while !stop.is_stopped() {
                    if watchdog.poll(&monitor) {
                        tracing::debug!(idle_for = ?monitor.idle_for(), "inactivity limit exceeded");
                        if stop.control.send(Control::Inactive).is_err() {
                            break;
                        }
                    }
                    thread::sleep(poll);
                }
            })
    }
}

/// Reports each idle stretch once.
#[derive(Debug)]
struct Watchdog {
    limit_secs: u64,
    last_idle: Duration,
    reported: bool,
}

impl Watchdog {
    fn new(limit_secs: u64) -> Self {
        Self {
            limit_secs,
            last_idle: Duration::ZERO,
            reported: false,
        }
    }

    /// `true` when a new idle stretch has crossed the limit.
    fn poll(&mut self, monitor: &ActivityMonitor) -> bool {
        let idle = monitor.idle_for();
        // Any input since the last poll starts a new stretch, even if it was
        // already stale by the time we looked.
        if idle < self.last_idle {
            self.reported = false;
        }
        self.last_idle = idle;

        if !monitor.is_inactive_beyond(self.limit_secs) {
            self.reported = false;
            return false;
        }
        !std::mem::replace(&mut self.reported, true)
    }
}
