use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{tlog_debug, Error, Result};

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;
pub const DEFAULT_FAILURE_CAPACITY: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub history_limit: usize,
    pub failure_capacity: usize,
    /// Program used by `session create` when none is given.
    pub shell: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            failure_capacity: DEFAULT_FAILURE_CAPACITY,
            shell: None,
        }
    }
}

impl Config {
    pub fn app_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".termpilot"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("config.toml"))
    }

    pub fn failure_log_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("last_errors.json"))
    }

    pub fn history_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("history"))
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// `shell` from config, then `$SHELL`, then `sh`.
    pub fn effective_shell(&self) -> String {
        self.shell
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| std::env::var("SHELL").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "sh".to_string())
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        tlog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            tlog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        tlog_debug!(
            "Config loaded: max_retries={} backoff_ms={} history_limit={} failure_capacity={}",
            config.max_retries,
            config.retry_backoff_ms,
            config.history_limit,
            config.failure_capacity
        );
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        tlog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    pub fn ensure_dirs() -> Result<()> {
        let dir = Self::app_dir()?;
        if !dir.exists() {
            tlog_debug!("Creating app directory: {}", dir.display());
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}
