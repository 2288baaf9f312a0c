mod activity;
mod engine;

pub use activity::{ActivityMonitor, Clock, InputKind, ManualClock, SystemClock};
pub use engine::{IntervalEngine, IntervalState, Phase};
