//! Runs a work session in the foreground.

use chronotask_core::{
    Config, InputSource, Notifier, Paths, QuitReader, Session, SessionController, SessionLog,
    Settings, TaskStore,
};

use super::CmdResult;

fn notifier(config: &Config) -> Box<dyn Notifier> {
    #[cfg(feature = "desktop")]
    {
        Box::new(chronotask_core::DesktopNotifier::new(config.notifications.clone()))
    }
    #[cfg(not(feature = "desktop"))]
    {
        if config.notifications.enabled {
            tracing::debug!("built without desktop notifications, printing to the terminal");
        }
        Box::new(chronotask_core::ConsoleNotifier)
    }
}

fn input_sources() -> Vec<Box<dyn InputSource>> {
    #[cfg_attr(not(feature = "input-hooks"), allow(unused_mut))]
    let mut sources: Vec<Box<dyn InputSource>> = vec![Box::new(QuitReader::stdin())];
    #[cfg(feature = "input-hooks")]
    sources.push(Box::new(chronotask_core::GlobalInputHook::new()));
    sources
}

/// Work on `task_id` until the user types `q`, closes stdin or presses
/// Ctrl-C.
pub fn start(paths: &Paths, store: TaskStore, task_id: &str) -> CmdResult {
    let config = Config::load_from(&paths.config_file())?;
    let settings = Settings::from_config(&config)?;

    let mut session = Session::begin(
        task_id,
        settings,
        store,
        notifier(&config),
        SessionLog::new(paths.summary_file()),
    )?;

    let controller = SessionController::new(settings);
    let stop = controller.stop_handle();
    if let Err(e) = ctrlc::set_handler(move || stop.request_stop()) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }

    println!("Type 'q' to stop the timer:");
    let summary = controller.run(&mut session, input_sources())?;
    println!(
        "Work stopped. Pomodoros completed: {}, work minutes: {}, rest minutes: {}",
        summary.pomodoros, summary.total_work_minutes, summary.total_rest_minutes
    );
    Ok(())
}
