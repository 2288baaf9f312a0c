//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Interval durations and the inactivity limit
//! - Notification preferences
//!
//! Configuration is stored at `<data dir>/config.toml`. Durations are in
//! minutes except `inactivity_limit`, which is in seconds.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Timer-specific configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_duration")]
    pub work_duration: u64,
    #[serde(default = "default_short_rest")]
    pub short_rest_duration: u64,
    #[serde(default = "default_long_rest")]
    pub long_rest_duration: u64,
    #[serde(default = "default_pomodoros_before_long_rest")]
    pub pomodoros_before_long_rest: u32,
    #[serde(default = "default_inactivity_limit")]
    pub inactivity_limit: u64,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub sound: bool,
    /// Path to a custom notification sound file (optional).
    /// If set, this file is played instead of the built-in chime.
    #[serde(default)]
    pub custom_sound: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_work_duration() -> u64 {
    25
}
fn default_short_rest() -> u64 {
    5
}
fn default_long_rest() -> u64 {
    15
}
fn default_pomodoros_before_long_rest() -> u32 {
    4
}
fn default_inactivity_limit() -> u64 {
    90
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            short_rest_duration: default_short_rest(),
            long_rest_duration: default_long_rest(),
            pomodoros_before_long_rest: default_pomodoros_before_long_rest(),
            inactivity_limit: default_inactivity_limit(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
            custom_sound: None,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if matches!(parts.peek(), None | Some(&"")) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => value
                    .parse::<bool>()
                    .map(serde_json::Value::Bool)
                    .map_err(|e| invalid(e.to_string()))?,
                serde_json::Value::Number(_) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid("cannot replace a whole section".into()));
                }
                // Strings and unset optionals.
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Load from `path`, or return defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key.
    ///
    /// The result must still produce valid [`Settings`]; the previous value
    /// is kept when it does not.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// or validated.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Settings::from_config(&updated)?;
        *self = updated;
        Ok(())
    }
}

/// Immutable per-session timer settings, in seconds.
///
/// Built once when a session starts and passed to every component that
/// needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub work_seconds: u64,
    pub short_rest_seconds: u64,
    pub long_rest_seconds: u64,
    pub pomodoros_before_long_rest: u32,
    pub inactivity_limit_seconds: u64,
}

impl Settings {
    /// Build settings from a loaded config, validating every duration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` if any duration is zero or the long-rest cadence
    /// is below one.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let timer = &config.timer;
        let settings = Self {
            work_seconds: timer.work_duration.saturating_mul(60),
            short_rest_seconds: timer.short_rest_duration.saturating_mul(60),
            long_rest_seconds: timer.long_rest_duration.saturating_mul(60),
            pomodoros_before_long_rest: timer.pomodoros_before_long_rest,
            inactivity_limit_seconds: timer.inactivity_limit,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check the invariants: every duration > 0 and a long-rest cadence >= 1.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("timer.work_duration", self.work_seconds),
            ("timer.short_rest_duration", self.short_rest_seconds),
            ("timer.long_rest_duration", self.long_rest_seconds),
            ("timer.inactivity_limit", self.inactivity_limit_seconds),
            (
                "timer.pomodoros_before_long_rest",
                u64::from(self.pomodoros_before_long_rest),
            ),
        ];
        for (key, value) in checks {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".into(),
                });
            }
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_seconds: 25 * 60,
            short_rest_seconds: 5 * 60,
            long_rest_seconds: 15 * 60,
            pomodoros_before_long_rest: 4,
            inactivity_limit_seconds: 90,
        }
    }
}
