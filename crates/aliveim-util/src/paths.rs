//! Default paths for aliveim components
//!
//! - Config: `$XDG_CONFIG_HOME/aliveim/config.toml` or `~/.config/aliveim/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const ALIVEIM_CONFIG_ENV: &str = "ALIVEIM_CONFIG";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Application subdirectory name
const APP_DIR: &str = "aliveim";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/aliveim/config.toml` (if XDG_CONFIG_HOME is set)
/// 2. `~/.config/aliveim/config.toml` (if HOME is set)
/// 3. `/etc/aliveim/config.toml` (fallback)
///
/// `$ALIVEIM_CONFIG` is handled by the CLI layer.
pub fn default_config_path() -> PathBuf {
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
