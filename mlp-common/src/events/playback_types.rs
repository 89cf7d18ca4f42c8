//! Playback-related type definitions
//!
//! Supporting types for the underlying player state and the list player's
//! playback mode.

use serde::{Deserialize, Serialize};

/// State reported by an underlying media player
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    /// No media loaded, nothing happened yet
    #[default]
    NothingSpecial,
    Opening,
    Buffering,
    Playing,
    Paused,
    Stopped,
    /// Media played to its end
    Ended,
    Error,
}

impl PlayerState {
    /// True while the player is starting or producing output
    pub fn is_active(self) -> bool {
        matches!(
            self,
            PlayerState::Opening | PlayerState::Buffering | PlayerState::Playing
        )
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerState::NothingSpecial => write!(f, "idle"),
            PlayerState::Opening => write!(f, "opening"),
            PlayerState::Buffering => write!(f, "buffering"),
            PlayerState::Playing => write!(f, "playing"),
            PlayerState::Paused => write!(f, "paused"),
            PlayerState::Stopped => write!(f, "stopped"),
            PlayerState::Ended => write!(f, "ended"),
            PlayerState::Error => write!(f, "error"),
        }
    }
}

/// How the list player behaves when it reaches a list boundary
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Stop and report the list as played
    #[default]
    Default,
    /// Wrap around to the other end of the root list
    Loop,
    /// Keep replaying the current item
    Repeat,
}

impl std::fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackMode::Default => write!(f, "default"),
            PlaybackMode::Loop => write!(f, "loop"),
            PlaybackMode::Repeat => write!(f, "repeat"),
        }
    }
}

impl std::str::FromStr for PlaybackMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(PlaybackMode::Default),
            "loop" => Ok(PlaybackMode::Loop),
            "repeat" => Ok(PlaybackMode::Repeat),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown playback mode: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_state_is_active() {
        assert!(PlayerState::Opening.is_active());
        assert!(PlayerState::Buffering.is_active());
        assert!(PlayerState::Playing.is_active());
        assert!(!PlayerState::Paused.is_active());
        assert!(!PlayerState::Stopped.is_active());
        assert!(!PlayerState::Ended.is_active());
        assert!(!PlayerState::NothingSpecial.is_active());
    }

    #[test]
    fn test_playback_mode_parse() {
        assert_eq!("loop".parse::<PlaybackMode>().unwrap(), PlaybackMode::Loop);
        assert_eq!("REPEAT".parse::<PlaybackMode>().unwrap(), PlaybackMode::Repeat);
        assert_eq!("default".parse::<PlaybackMode>().unwrap(), PlaybackMode::Default);
        assert!("shuffle".parse::<PlaybackMode>().is_err());
    }

    #[test]
    fn test_playback_mode_serde_lowercase() {
        let json = serde_json::to_string(&PlaybackMode::Loop).unwrap();
        assert_eq!(json, "\"loop\"");
        let mode: PlaybackMode = serde_json::from_str("\"repeat\"").unwrap();
        assert_eq!(mode, PlaybackMode::Repeat);
    }
}
