//! mlp-player specific configuration

use crate::error::Result;
use mlp_common::config::{ConfigResolver, PlayerSection, TomlConfig};
use mlp_common::events::PlaybackMode;
use std::path::Path;

/// Settings applied when a list player is created
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSettings {
    pub playback_mode: PlaybackMode,
    pub event_capacity: usize,
    pub worker_thread_name: String,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self::from(&PlayerSection::default())
    }
}

impl From<&PlayerSection> for PlayerSettings {
    fn from(section: &PlayerSection) -> Self {
        Self {
            playback_mode: section.playback_mode,
            event_capacity: section.event_capacity,
            worker_thread_name: section.worker_thread_name.clone(),
        }
    }
}

impl From<&TomlConfig> for PlayerSettings {
    fn from(config: &TomlConfig) -> Self {
        Self::from(&config.player)
    }
}

/// Load the bootstrap configuration
///
/// `cli_path` wins over `MLP_CONFIG`, which wins over the per-user file.
pub fn load_config(cli_path: Option<&Path>) -> Result<TomlConfig> {
    Ok(ConfigResolver::new().resolve(cli_path)?)
}
