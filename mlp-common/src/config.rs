//! Bootstrap configuration loading
//!
//! Configuration is a small TOML file. Resolution follows this priority
//! order:
//! 1. Explicit path (command-line argument)
//! 2. Environment variable (`MLP_CONFIG` by default)
//! 3. Per-user config file (`<config_dir>/mlp/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing per-user file is not an error: a warning is logged and the
//! compiled defaults are used. An explicitly named file that is missing or
//! malformed is an error.

use crate::events::PlaybackMode;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable consulted when no explicit path is given
pub const CONFIG_ENV_VAR: &str = "MLP_CONFIG";

/// Top-level configuration file contents
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct TomlConfig {
    /// Media-list player settings
    #[serde(default)]
    pub player: PlayerSection,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[player]` section
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlayerSection {
    /// Playback mode applied to newly created players
    #[serde(default)]
    pub playback_mode: PlaybackMode,

    /// Per-subscriber buffer of the player's event bus
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Name given to the deferred-advance worker thread
    #[serde(default = "default_worker_thread_name")]
    pub worker_thread_name: String,
}

impl Default for PlayerSection {
    fn default() -> Self {
        Self {
            playback_mode: PlaybackMode::default(),
            event_capacity: default_event_capacity(),
            worker_thread_name: default_worker_thread_name(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_event_capacity() -> usize {
    64
}

fn default_worker_thread_name() -> String {
    "mlp-advance".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.player.event_capacity == 0 {
            return Err(Error::Config(
                "player.event_capacity must be greater than zero".to_string(),
            ));
        }
        if self.player.worker_thread_name.trim().is_empty() {
            return Err(Error::Config(
                "player.worker_thread_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolves which configuration file to load
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    env_var_name: String,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::with_env_var(CONFIG_ENV_VAR)
    }

    pub fn with_env_var(env_var_name: &str) -> Self {
        Self {
            env_var_name: env_var_name.to_string(),
        }
    }

    /// Resolve and load the configuration
    ///
    /// `cli_path` wins over the environment variable, which wins over the
    /// per-user file. Falls back to [`TomlConfig::default`].
    pub fn resolve(&self, cli_path: Option<&Path>) -> Result<TomlConfig> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_path {
            return TomlConfig::load(path);
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(&self.env_var_name) {
            debug!("Using config path from {}", self.env_var_name);
            return TomlConfig::load(Path::new(&path));
        }

        // Priority 3: Per-user config file
        if let Some(path) = default_config_path() {
            if path.exists() {
                return TomlConfig::load(&path);
            }
            warn!(
                "No config file at {}, using compiled defaults",
                path.display()
            );
        } else {
            warn!("Could not determine config directory, using compiled defaults");
        }

        // Priority 4: Compiled defaults
        Ok(TomlConfig::default())
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-user configuration file location for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mlp").join("config.toml"))
}
