mod config;

pub use config::{Config, NotificationsConfig, Settings, TimerConfig};

use std::path::{Path, PathBuf};

const DATA_FILE: &str = "data.json";
const SUMMARY_FILE: &str = "pomodoro_summary.txt";
const CONFIG_FILE: &str = "config.toml";

/// Returns `$CHRONOTASK_HOME` if set, otherwise the platform data directory
/// joined with `chronotask/`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("CHRONOTASK_HOME") {
        Some(home) => PathBuf::from(home),
        None => dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chronotask"),
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Locations of every file the application reads or writes.
///
/// Built once at startup and handed to whatever needs a path.
#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    /// Resolve paths under the default data directory.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn discover() -> std::io::Result<Self> {
        Ok(Self { root: data_dir()? })
    }

    /// Resolve paths under an explicit directory.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_file(&self) -> PathBuf {
        self.root.join(DATA_FILE)
    }

    pub fn summary_file(&self) -> PathBuf {
        self.root.join(SUMMARY_FILE)
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }
}
