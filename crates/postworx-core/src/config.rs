//! Application configuration management.
//!
//! Configuration is a JSON file stored at `~/.config/postworx/config.json`
//! (or wherever `--config` points). A missing file is replaced by a template
//! the user has to fill in before the first sync.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sync::{DateWindow, SyncOptions};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "postworx";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Shift cache file name in the cache directory
const CACHE_FILE: &str = "shifts.json";

/// Calendar output directory, relative to the working directory
const DEFAULT_OUTPUT_DIR: &str = "Schedule";

const DEFAULT_DAYS: u32 = 30;
const DEFAULT_TIMEZONE: &str = "US/Eastern";
const TEMPLATE_HOST: &str = "example.ct-teamworx.com";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No config found. A template was written to {0}; edit it and run again.")]
    Created(PathBuf),

    #[error("Invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Could not find {0} directory")]
    MissingDirectory(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Scheduling site host, e.g. `acme.ct-teamworx.com`
    pub host: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_days")]
    pub days_before: u32,
    #[serde(default = "default_days")]
    pub days_after: u32,
    /// Drop cached shifts older than the sync window
    #[serde(default)]
    pub cull_cache: bool,
    /// Abort the whole run if any shift's roster cannot be fetched
    #[serde(default)]
    pub fail_fast: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_days() -> u32 {
    DEFAULT_DAYS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: TEMPLATE_HOST.to_string(),
            username: "example@email.com".to_string(),
            password: None,
            timezone: default_timezone(),
            days_before: DEFAULT_DAYS,
            days_after: DEFAULT_DAYS,
            cull_cache: false,
            fail_fast: false,
            output_dir: None,
            cache_dir: None,
        }
    }
}

impl Config {
    /// Load and validate the config at `path`.
    ///
    /// If the file does not exist a template is written there and
    /// `ConfigError::Created` is returned.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            Self::default().save_to(path)?;
            return Err(ConfigError::Created(path.to_path_buf()).into());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::MissingDirectory("config"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "host",
                reason: "must not be empty".to_string(),
            });
        }
        if self.host == TEMPLATE_HOST {
            return Err(ConfigError::Invalid {
                field: "host",
                reason: "still set to the template value".to_string(),
            });
        }
        if self.username.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "username",
                reason: "must not be empty".to_string(),
            });
        }
        self.tz()?;
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::Invalid {
                field: "timezone",
                reason: e.to_string(),
            })
    }

    /// Organization name from the host: `acme.ct-teamworx.com` -> `Acme`.
    pub fn org_name(&self) -> String {
        let label = self
            .host
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .split('.')
            .next()
            .unwrap_or_default();

        let mut chars = label.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir().ok_or(ConfigError::MissingDirectory("cache"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn cache_file(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join(CACHE_FILE))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    pub fn window(&self, today: NaiveDate) -> DateWindow {
        DateWindow::around(today, self.days_before, self.days_after)
    }

    pub fn sync_options(&self, today: NaiveDate) -> SyncOptions {
        SyncOptions {
            window: self.window(today),
            cull_cache: self.cull_cache,
            fail_fast: self.fail_fast,
        }
    }
}
