//! Configuration Store
//!
//! Loads `sherwood.toml`. Every field is optional; a missing file means
//! the built-in defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::aggregate::FanOutMode;
use crate::error::{Result, SherwoodError};
use crate::llm::BackendId;

/// How interns are dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOutSetting {
    #[default]
    Sequential,
    Concurrent,
}

/// Per-backend model or endpoint replacement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendOverride {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Upper bound for a single backend call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sampling temperature for interns
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub fan_out: FanOutSetting,

    /// Interns in flight at once when `fan_out = "concurrent"`
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Send bot notifications after each answer
    #[serde(default = "default_true")]
    pub notify: bool,

    /// Keyed by backend name, e.g. `[backends.sonar]`
    #[serde(default)]
    pub backends: HashMap<String, BackendOverride>,
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.5
}

fn default_max_in_flight() -> usize {
    3
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            fan_out: FanOutSetting::default(),
            max_in_flight: default_max_in_flight(),
            notify: true,
            backends: HashMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| SherwoodError::InvalidConfig {
            message: format!("{}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load an explicit file, else the first file found in the standard
    /// locations, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match super::find_config_file() {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(SherwoodError::InvalidConfig {
                message: "timeout_secs must be greater than zero".to_string(),
            });
        }
        if self.max_in_flight == 0 {
            return Err(SherwoodError::InvalidConfig {
                message: "max_in_flight must be greater than zero".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(SherwoodError::InvalidConfig {
                message: format!("temperature {} is outside 0.0..=2.0", self.temperature),
            });
        }
        for key in self.backends.keys() {
            key.parse::<BackendId>()
                .map_err(|message| SherwoodError::InvalidConfig { message })?;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn fan_out_mode(&self) -> FanOutMode {
        match self.fan_out {
            FanOutSetting::Sequential => FanOutMode::Sequential,
            FanOutSetting::Concurrent => FanOutMode::Concurrent {
                max_in_flight: self.max_in_flight,
            },
        }
    }

    pub fn model_for(&self, id: BackendId) -> String {
        self.override_for(id)
            .and_then(|o| o.model.clone())
            .unwrap_or_else(|| id.default_model().to_string())
    }

    pub fn base_url_for(&self, id: BackendId) -> String {
        self.override_for(id)
            .and_then(|o| o.base_url.clone())
            .unwrap_or_else(|| id.provider().default_base_url().to_string())
    }

    fn override_for(&self, id: BackendId) -> Option<&BackendOverride> {
        self.backends
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(id.key()))
            .map(|(_, o)| o)
    }
}
