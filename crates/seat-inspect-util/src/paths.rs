//! Default paths for seat-inspect
//!
//! The configuration file is looked up in:
//! - `$SEAT_INSPECT_CONFIG`
//! - `$XDG_CONFIG_HOME/seat-inspect/config.toml`
//! - `~/.config/seat-inspect/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the config path
pub const SEAT_INSPECT_CONFIG_ENV: &str = "SEAT_INSPECT_CONFIG";

/// Environment variable for overriding the loginctl program
pub const SEAT_INSPECT_LOGINCTL_ENV: &str = "SEAT_INSPECT_LOGINCTL";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Application subdirectory name
const APP_DIR: &str = "seat-inspect";

/// Get the default configuration file path.
///
/// Order of precedence:
/// 1. `$SEAT_INSPECT_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/seat-inspect/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/seat-inspect/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(SEAT_INSPECT_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_path_without_env()
}

/// Get the config path without checking SEAT_INSPECT_CONFIG.
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
    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}
