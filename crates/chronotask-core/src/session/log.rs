use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use super::SessionSummary;

const TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";
const SEPARATOR: &str = "------------------------------------";

/// Append-only, human-readable log of work sessions.
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_start(&self, at: NaiveDateTime) -> std::io::Result<()> {
        self.append(&format!("Work started at:  {}\n", at.format(TIMESTAMP)))
    }

    pub fn record_summary(&self, summary: &SessionSummary) -> std::io::Result<()> {
        self.append(&format!(
            "Work stopped at:  {}\n\
             Pomodoros completed: {}\n\
             Total work minutes: {}\n\
             Total rest minutes: {}\n\
             {SEPARATOR}\n",
            summary.stopped_at.format(TIMESTAMP),
            summary.pomodoros,
            summary.total_work_minutes,
            summary.total_rest_minutes,
        ))
    }

    fn append(&self, text: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(text.as_bytes())
    }
}
