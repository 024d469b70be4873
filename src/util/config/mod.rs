//! ipylua configuration system
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. CLI arguments
//! 2. Environment variables (IPYLUA_LOG)
//! 3. Explicit file (--config path)
//! 4. User-level (~/.config/ipylua/config.toml)
//! 5. Default values
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use ipylua::util::config::load_user_config;
//!
//! // Missing file yields the defaults
//! let config = load_user_config().unwrap().with_env_overrides();
//! println!("log level: {}", config.log.level);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding `log.level`.
pub const LOG_ENV_VAR: &str = "IPYLUA_LOG";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BridgeConfig {
    /// Embedded runtime settings
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
    /// REPL settings
    #[serde(default)]
    pub repl: ReplConfig,
}

/// Embedded runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Global Lua function every evaluation goes through
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
    /// Load the bootstrap fragment as part of start
    #[serde(default = "default_autoload_bootstrap")]
    pub autoload_bootstrap: bool,
    /// Replacement bootstrap file; the built-in one when unset
    #[serde(default)]
    pub bootstrap: Option<PathBuf>,
    /// Deepest table nesting translated before falling back to `<table>`
    #[serde(default = "default_max_render_depth")]
    pub max_render_depth: usize,
    /// MIME types recognized in addition to the built-in display types
    #[serde(default)]
    pub extra_mime_types: Vec<String>,
}

fn default_entry_point() -> String {
    "IPyLuaEval".to_string()
}

fn default_autoload_bootstrap() -> bool {
    true
}

fn default_max_render_depth() -> usize {
    16
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            entry_point: default_entry_point(),
            autoload_bootstrap: true,
            bootstrap: None,
            max_render_depth: 16,
            extra_mime_types: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// One of debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// REPL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplConfig {
    /// History size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    /// History file path
    #[serde(default)]
    pub history_file: Option<PathBuf>,
    /// Prompt string
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_history_size() -> usize {
    1000
}

fn default_prompt() -> String {
    "lua> ".to_string()
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            history_size: 1000,
            history_file: None,
            prompt: default_prompt(),
        }
    }
}

impl BridgeConfig {
    /// Apply environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var(LOG_ENV_VAR) {
            if !level.trim().is_empty() {
                self.log.level = level.trim().to_string();
            }
        }
        self
    }
}

/// Get the user config directory
pub fn get_config_dir() -> Option<PathBuf> {
    // Try XDG config directory on Unix
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join("ipylua"));
    }

    // Fallback to ~/.config/ipylua
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join("ipylua"));
    }

    // On Windows, try %APPDATA%
    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join("ipylua"));
    }

    None
}

/// Get the user config file path (~/.config/ipylua/config.toml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load user-level configuration
/// Returns default config if file doesn't exist
pub fn load_user_config() -> Result<BridgeConfig, ConfigError> {
    match get_config_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Ok(BridgeConfig::default()),
    }
}

/// Load configuration from an explicit file
pub fn load_config_from(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::IoError)?;
    parse_config(&content)
}

/// Parse configuration from TOML text
pub fn parse_config(content: &str) -> Result<BridgeConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::ParseError)
}

/// Save configuration to an explicit file
pub fn save_config_to(
    config: &BridgeConfig,
    path: &Path,
) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir).map_err(ConfigError::IoError)?;
        }
    }

    let content = toml::to_string_pretty(config).map_err(ConfigError::SerializeError)?;
    fs::write(path, content).map_err(ConfigError::IoError)?;

    Ok(())
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[source] std::io::Error),

    #[error("Config parse error: {0}")]
    ParseError(#[source] toml::de::Error),

    #[error("Config serialize error: {0}")]
    SerializeError(#[source] toml::ser::Error),
}
