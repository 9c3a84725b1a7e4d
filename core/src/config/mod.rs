//! Configuration management
//!
//! Secrets come from the process environment and are read once at
//! start-up. Everything else (models, endpoints, timeouts, fan-out mode)
//! lives in an optional `sherwood.toml`.

pub mod secrets;
pub mod store;

pub use secrets::{BotSecrets, Secrets};
pub use store::{BackendOverride, Config, FanOutSetting};

use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "sherwood.toml";

/// Find the configuration file in standard locations
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        let path = cwd.join(CONFIG_FILE_NAME);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(dir) = get_config_dir() {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            return Some(path);
        }
    }

    None
}

/// Get the configuration directory path
pub fn get_config_dir() -> Option<PathBuf> {
    use dirs::config_dir;
    use home::home_dir;

    if let Some(dir) = config_dir() {
        return Some(dir.join("sherwood"));
    }

    if let Some(home) = home_dir() {
        return Some(home.join(".config").join("sherwood"));
    }

    None
}

/// Directory for the debug log
pub fn get_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("sherwood")
}
