//! # Chronotask Core Library
//!
//! Core logic for the chronotask pomodoro task tracker. The `chronotask`
//! binary is a thin CLI over this crate.
//!
//! ## Architecture
//!
//! - **Interval engine**: a tick-driven state machine that alternates work
//!   and rest phases and returns [`Event`]s for the caller to act on
//! - **Activity monitor**: lock-free record of the last user input, fed by
//!   input listeners on their own threads
//! - **Session**: binds the engine to the task ledger, the notifier and the
//!   session log; [`SessionController`] runs it with its listener threads
//! - **Storage**: a JSON task document and TOML configuration
//!
//! ## Key Components
//!
//! - [`IntervalEngine`]: work/rest state machine
//! - [`TaskStore`]: task records and their work history
//! - [`Session`] and [`SessionController`]: one running work session
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod session;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;

pub use error::{ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use notify::{ConsoleNotifier, MemoryNotifier, Notifier};
#[cfg(feature = "desktop")]
pub use notify::DesktopNotifier;
pub use session::{
    InputSource, QuitReader, Session, SessionController, SessionLog, SessionSummary, StopHandle,
};
#[cfg(feature = "input-hooks")]
pub use session::GlobalInputHook;
pub use stats::{minutes_by_date, DayWork, MonthlyWork};
pub use storage::{Config, Paths, Settings};
pub use task::{
    round_minutes, NewTask, StatusFilter, TaskPatch, TaskRecord, TaskStatus, TaskStore,
    WorkLedger, WorkSession,
};
pub use timer::{ActivityMonitor, Clock, InputKind, IntervalEngine, ManualClock, Phase, SystemClock};
