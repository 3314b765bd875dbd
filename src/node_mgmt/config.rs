use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::constants::defaults;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("could not parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// ecobee developer API key (OAuth client id)
    pub api_key: String,
    pub datadog_api_key: String,
    pub datadog_app_key: String,
    /// Directory holding the persisted token file
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    #[serde(default = "default_poll_interval_s")]
    pub poll_interval_s: u64,
    pub thermostats: Vec<ThermostatConfig>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ThermostatConfig {
    pub id: String,
    /// `write_<measurement>` flags; anything not listed defaults to emit
    #[serde(default)]
    pub write_options: BTreeMap<String, bool>,
    /// Stamp weather metrics with the poll time instead of the (often
    /// lagging) station observation time
    #[serde(default)]
    pub always_write_weather_as_current: bool,
}

impl Config {
    pub fn token_file(&self) -> PathBuf {
        self.work_dir.join(defaults::TOKEN_FILE_NAME)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_s)
    }
}

impl ThermostatConfig {
    /// Absent write options default to emit; only an explicit `false`
    /// suppresses a measurement.
    pub fn write_enabled(&self, option: &str) -> bool {
        self.write_options.get(option).copied().unwrap_or(true)
    }
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_poll_interval_s() -> u64 {
    defaults::POLL_INTERVAL.as_secs()
}

pub fn from_str(raw: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(raw)?;
    if config.thermostats.is_empty() {
        return Err(ConfigError::Invalid("no thermostats configured".into()));
    }
    Ok(config)
}

pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
    from_str(&fs::read_to_string(path)?)
}
