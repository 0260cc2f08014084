use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::analyzer::PollSchedule;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";
pub const ENDPOINT_ENV: &str = "REPOCHAT_ENDPOINT";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings read from `~/.config/repochat/config.json`. Every field is
/// optional; anything missing falls back to the built-in default.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer_poll_interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer_poll_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_poll_interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_poll_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub welcome_prompt: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Persist a new analyzer endpoint, keeping every other setting.
    pub fn save_endpoint(endpoint: &str) -> Result<Self> {
        Self::save_endpoint_to(&Self::get_config_path()?, endpoint)
    }

    pub fn save_endpoint_to(config_path: &Path, endpoint: &str) -> Result<Self> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(anyhow!("Endpoint must not be empty"));
        }

        let mut config = Self::load_from(config_path).unwrap_or_else(|_| Self::new());
        config.endpoint = Some(endpoint.to_string());
        config.save_to(config_path)?;
        Ok(config)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("repochat").join("config.json"))
    }

    /// Base URL of the analyzer service: explicit override (CLI flag), then
    /// `REPOCHAT_ENDPOINT`, then the config file, then the default.
    pub fn resolve_endpoint(&self, cli_override: Option<&str>) -> String {
        cli_override
            .map(str::to_string)
            .or_else(|| std::env::var(ENDPOINT_ENV).ok().filter(|v| !v.trim().is_empty()))
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
                .max(1),
        )
    }

    pub fn analyzer_schedule(&self) -> PollSchedule {
        let default = PollSchedule::analyzer_default();
        PollSchedule::new(
            self.analyzer_poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(default.interval),
            self.analyzer_poll_attempts.unwrap_or(default.max_attempts).max(1),
        )
    }

    pub fn query_schedule(&self) -> PollSchedule {
        let default = PollSchedule::query_default();
        PollSchedule::new(
            self.query_poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(default.interval),
            self.query_poll_attempts.unwrap_or(default.max_attempts).max(1),
        )
    }
}
