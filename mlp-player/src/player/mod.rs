//! Underlying media player interface
//!
//! The list player drives exactly one underlying player. Decoding and
//! output are the player's business; the list player only retargets it,
//! starts/stops it, and listens for [`PlayerEvent::EndReached`].

mod simulated;

pub use simulated::SimulatedPlayer;

use crate::error::Result;
use crate::media::Media;
use mlp_common::events::{EventManager, PlayerState};

/// Notifications sent by an underlying player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The current media played to its end
    EndReached,
    /// The player moved to a new state
    StateChanged(PlayerState),
}

/// Operations the list player needs from an underlying media player
///
/// Implementations may send events from any thread, including from inside
/// `play()`/`stop()` on the caller's thread.
pub trait MediaPlayer: Send + Sync {
    /// Make `media` the current target; does not start playback
    fn set_media(&self, media: &Media);

    /// Current target, if any
    fn media(&self) -> Option<Media>;

    /// Start or resume playback of the current target
    fn play(&self) -> Result<()>;

    /// Toggle pause
    fn pause(&self);

    fn set_pause(&self, pause: bool);

    /// Request a stop; may complete asynchronously
    fn stop(&self);

    fn state(&self) -> PlayerState;

    /// Observer registration for [`PlayerEvent`]s
    fn event_manager(&self) -> &EventManager<PlayerEvent>;
}
