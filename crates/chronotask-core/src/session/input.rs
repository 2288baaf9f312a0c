use std::io::BufRead;
use std::sync::Arc;

use super::StopHandle;
use crate::timer::{ActivityMonitor, InputKind};

/// A producer of user input that runs on its own thread for the lifetime of
/// a session.
pub trait InputSource: Send + 'static {
    /// Thread name.
    fn name(&self) -> &str;

    /// Block, reporting input to `monitor`, until the source is exhausted or
    /// `stop` is set.
    fn run(self: Box<Self>, monitor: Arc<ActivityMonitor>, stop: StopHandle);
}

/// Reads lines from the terminal: `q` stops the session, any other
/// non-empty line counts as activity. End of input also stops the session.
pub struct QuitReader<R> {
    reader: R,
}

impl<R: BufRead + Send + 'static> QuitReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl QuitReader<std::io::BufReader<std::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(std::io::BufReader::new(std::io::stdin()))
    }
}

impl<R: BufRead + Send + 'static> InputSource for QuitReader<R> {
    fn name(&self) -> &str {
        "quit-reader"
    }

    fn run(self: Box<Self>, monitor: Arc<ActivityMonitor>, stop: StopHandle) {
        for line in self.reader.lines() {
            if stop.is_stopped() {
                return;
            }
            match line {
                Ok(line) => {
                    let command = line.trim();
                    if command.eq_ignore_ascii_case("q") {
                        stop.request_stop();
                        return;
                    }
                    if !command.is_empty() {
                        monitor.record_activity(InputKind::Terminal);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read terminal input");
                    break;
                }
            }
        }
        if !stop.is_stopped() {
            tracing::info!("terminal input closed, stopping session");
            stop.request_stop();
        }
    }
}

#[cfg(feature = "input-hooks")]
pub use hook::GlobalInputHook;

#[cfg(feature = "input-hooks")]
mod hook {
    use std::sync::Arc;

    use rdev::EventType;

    use super::InputSource;
    use crate::session::StopHandle;
    use crate::timer::{ActivityMonitor, InputKind};

    /// System-wide pointer and keyboard listener.
    ///
    /// One hook observes both devices; the platform backends keep a single
    /// global callback per process.
    #[derive(Debug, Default)]
    pub struct GlobalInputHook;

    impl GlobalInputHook {
        pub fn new() -> Self {
            Self
        }
    }

    fn classify(event: &EventType) -> Option<InputKind> {
        match event {
            EventType::MouseMove { .. }
            | EventType::ButtonPress(_)
            | EventType::ButtonRelease(_)
            | EventType::Wheel { .. } => Some(InputKind::Pointer),
            EventType::KeyPress(_) | EventType::KeyRelease(_) => Some(InputKind::Keyboard),
        }
    }

    impl InputSource for GlobalInputHook {
        fn name(&self) -> &str {
            "input-hook"
        }

        fn run(self: Box<Self>, monitor: Arc<ActivityMonitor>, stop: StopHandle) {
            let result = rdev::listen(move |event| {
                if stop.is_stopped() {
                    return;
                }
                if let Some(kind) = classify(&event.event_type) {
                    monitor.record_activity(kind);
                }
            });
            if let Err(e) = result {
                tracing::warn!(error = ?e, "global input hook unavailable, only terminal input is tracked");
            }
        }
    }

}
