//! Default paths for classtime components
//!
//! Config lives at `$CLASSTIME_CONFIG`, else
//! `$XDG_CONFIG_HOME/classtime/config.toml`, else
//! `~/.config/classtime/config.toml`.

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const CLASSTIME_CONFIG_ENV: &str = "CLASSTIME_CONFIG";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Application subdirectory name
const APP_DIR: &str = "classtime";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$CLASSTIME_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/classtime/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/classtime/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CLASSTIME_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_path_without_env()
}

/// Get the config path without checking CLASSTIME_CONFIG env var.
pub fn config_path_without_env() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join(CONFIG_FILENAME)
}
