//! # Media-List Player Library (mlp-player)
//!
//! Plays a tree of media lists through one underlying media player.
//!
//! **Purpose:** Resolve next/previous items over nested lists, apply the
//! default / loop / repeat playback modes, and advance automatically when
//! the underlying player reaches the end of an item.
//!
//! **Architecture:** One [`MediaListPlayer`] per list, a dedicated advance
//! worker thread, and events published on an
//! [`EventBus`](mlp_common::events::EventBus).

pub mod config;
pub mod error;
pub mod list_player;
pub mod media;
pub mod player;

pub use config::PlayerSettings;
pub use error::{Error, Result};
pub use list_player::{AdvanceOutcome, MediaListPath, MediaListPlayer};
pub use media::{Media, MediaList};
pub use player::{MediaPlayer, PlayerEvent, SimulatedPlayer};
