use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{Error, Result};

const DEFAULT_ZOOM_FRACTION: f64 = 0.2;
const DEFAULT_MIN_SPAN_DAYS: i64 = 7;
const DEFAULT_MAX_SPAN_DAYS: i64 = 730;
const DEFAULT_DAYS_BEFORE_TODAY: i64 = 30;
const DEFAULT_DAYS_AFTER_TODAY: i64 = 60;
const DEFAULT_FALLBACK_TASK_HOURS: f64 = 8.0;

/// Engine settings, read from `~/.taskline/taskline.toml`.
///
/// Every field has a default, so a partial file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Share of the window removed from (or added to) each end per zoom step.
    pub zoom_fraction: f64,
    pub min_span_days: i64,
    pub max_span_days: i64,
    /// Initial window, relative to today.
    pub days_before_today: i64,
    pub days_after_today: i64,
    /// Duration used by the critical path for tasks without an estimate.
    pub fallback_task_hours: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zoom_fraction: DEFAULT_ZOOM_FRACTION,
            min_span_days: DEFAULT_MIN_SPAN_DAYS,
            max_span_days: DEFAULT_MAX_SPAN_DAYS,
            days_before_today: DEFAULT_DAYS_BEFORE_TODAY,
            days_after_today: DEFAULT_DAYS_AFTER_TODAY,
            fallback_task_hours: DEFAULT_FALLBACK_TASK_HOURS,
        }
    }
}

impl Config {
    pub fn taskline_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".taskline"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::taskline_dir()?.join("taskline.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load settings from `path`, falling back to defaults if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        if !path.exists() {
            debug!("config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        debug!(?config, "config loaded");
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Write settings to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                debug!(dir = %dir.display(), "creating config directory");
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// # Errors
    /// Returns `Validation` naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        if !(self.zoom_fraction > 0.0 && self.zoom_fraction < 0.5) {
            return Err(Error::Validation(format!(
                "zoom_fraction must be between 0 and 0.5, got {}",
                self.zoom_fraction
            )));
        }
        if self.min_span_days < 1 {
            return Err(Error::Validation(format!(
                "min_span_days must be at least 1, got {}",
                self.min_span_days
            )));
        }
        if self.min_span_days > self.max_span_days {
            return Err(Error::Validation(format!(
                "min_span_days ({}) is greater than max_span_days ({})",
                self.min_span_days, self.max_span_days
            )));
        }
        if self.days_before_today < 0 || self.days_after_today < 0 {
            return Err(Error::Validation(
                "default window offsets cannot be negative".to_string(),
            ));
        }
        if !(self.fallback_task_hours > 0.0) {
            return Err(Error::Validation(format!(
                "fallback_task_hours must be positive, got {}",
                self.fallback_task_hours
            )));
        }
        Ok(())
    }
}
