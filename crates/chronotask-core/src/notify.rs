//! Notification sinks.
//!
//! The session hands every event to a [`Notifier`]. Delivery is
//! fire-and-forget: a sink never blocks the tick driver and never reports
//! failure back to it.

use std::sync::{Arc, Mutex, PoisonError};

use crate::events::Event;

pub trait Notifier {
    fn notify(&self, event: &Event);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, event: &Event) {
        (**self).notify(event)
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, event: &Event) {
        (**self).notify(event)
    }
}

/// Prints every event to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, event: &Event) {
        println!("{}", event.message());
    }
}

/// Records events in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    events: Arc<Mutex<Vec<Event>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| predicate(e))
            .count()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, event: &Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[cfg(feature = "desktop")]
pub use desktop::DesktopNotifier;

#[cfg(feature = "desktop")]
mod desktop {
    use std::fs::File;
    use std::io::BufReader;
    use std::time::Duration;

    use notify_rust::Notification;
    use rodio::source::{SineWave, Source};
    use rodio::{Decoder, OutputStream, Sink};

    use super::Notifier;
    use crate::error::{CoreError, Result};
    use crate::events::Event;
    use crate::storage::NotificationsConfig;

    const TITLE: &str = "Pomodoro timer";

    /// Prints every event; boundary events also raise a desktop
    /// notification and play a sound on a detached thread.
    #[derive(Debug, Clone)]
    pub struct DesktopNotifier {
        config: NotificationsConfig,
    }

    impl DesktopNotifier {
        pub fn new(config: NotificationsConfig) -> Self {
            Self { config }
        }
    }

    impl Notifier for DesktopNotifier {
        fn notify(&self, event: &Event) {
            let message = event.message();
            println!("{message}");
            if !self.config.enabled || !event.is_alert() {
                return;
            }

            let config = self.config.clone();
            let spawned = std::thread::Builder::new()
                .name("notify".into())
                .spawn(move || {
                    if let Err(e) = show(&message) {
                        tracing::warn!(error = %e, "desktop notification failed");
                    }
                    if config.sound {
                        if let Err(e) = play(config.custom_sound.as_deref()) {
                            tracing::warn!(error = %e, "failed to play sound");
                        }
                    }
                });
            if let Err(e) = spawned {
                tracing::warn!(error = %e, "could not spawn notification thread");
            }
        }
    }

    fn show(message: &str) -> Result<()> {
        Notification::new()
            .appname("chronotask")
            .summary(TITLE)
            .body(message)
            .show()
            .map(|_| ())
            .map_err(delivery)
    }

    fn delivery(e: impl std::fmt::Display) -> CoreError {
        CoreError::NotificationDelivery(e.to_string())
    }

    fn play(custom_sound: Option<&str>) -> Result<()> {
        let (_stream, handle) = OutputStream::try_default().map_err(delivery)?;
        let sink = Sink::try_new(&handle).map_err(delivery)?;
        match custom_sound {
            Some(path) => {
                let file = File::open(path)?;
                let source = Decoder::new(BufReader::new(file)).map_err(delivery)?;
                sink.append(source);
            }
            None => {
                let chime = SineWave::new(880.0)
                    .take_duration(Duration::from_millis(350))
                    .amplify(0.2);
                sink.append(chime);
            }
        }
        sink.sleep_until_end();
        Ok(())
    }
}
