//! Timer-driven stand-in for a real media engine
//!
//! "Plays" each media for a fixed duration, then reports end reached from
//! its own timer thread, the same way a real engine reports from its
//! internal thread. Used by the demo binary and by tests.

use super::{MediaPlayer, PlayerEvent};
use crate::error::{Error, Result};
use crate::media::Media;
use mlp_common::events::{EventManager, PlayerState};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, trace};

struct Playback {
    media: Option<Media>,
    state: PlayerState,
    /// Bumped on every start/stop so stale timers can tell they are stale
    generation: u64,
}

struct SimulatedInner {
    playback: Mutex<Playback>,
    events: EventManager<PlayerEvent>,
    item_duration: Duration,
}

/// Player that reaches the end of every media after `item_duration`
///
/// Resuming after a pause restarts the full duration.
#[derive(Clone)]
pub struct SimulatedPlayer {
    inner: Arc<SimulatedInner>,
}

impl SimulatedPlayer {
    pub fn new(item_duration: Duration) -> Self {
        Self {
            inner: Arc::new(SimulatedInner {
                playback: Mutex::new(Playback {
                    media: None,
                    state: PlayerState::NothingSpecial,
                    generation: 0,
                }),
                events: EventManager::new(),
                item_duration,
            }),
        }
    }

    fn playback(&self) -> MutexGuard<'_, Playback> {
        self.inner.playback.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: PlayerState) {
        self.playback().state = state;
        self.inner.events.send(&PlayerEvent::StateChanged(state));
    }

    fn start_timer(&self, generation: u64) {
        let inner = Arc::clone(&self.inner);
        thread::spawn(move || {
            thread::sleep(inner.item_duration);
            let reached = {
                let mut playback = inner.playback.lock().unwrap_or_else(PoisonError::into_inner);
                let current = playback.generation == generation
                    && playback.state == PlayerState::Playing;
                if current {
                    playback.state = PlayerState::Ended;
                }
                current
            };
            if reached {
                trace!("Simulated media reached its end (generation {})", generation);
                inner.events.send(&PlayerEvent::StateChanged(PlayerState::Ended));
                inner.events.send(&PlayerEvent::EndReached);
            }
        });
    }
}

impl MediaPlayer for SimulatedPlayer {
    fn set_media(&self, media: &Media) {
        let mut playback = self.playback();
        playback.media = Some(media.clone());
        playback.state = PlayerState::NothingSpecial;
        playback.generation += 1;
        debug!("Simulated player target: {}", media.mrl());
    }

    fn media(&self) -> Option<Media> {
        self.playback().media.clone()
    }

    fn play(&self) -> Result<()> {
        let generation = {
            let mut playback = self.playback();
            if playback.media.is_none() {
                return Err(Error::Player("No media set".to_string()));
            }
            if playback.state == PlayerState::Playing {
                return Ok(());
            }
            playback.generation += 1;
            playback.state = PlayerState::Playing;
            playback.generation
        };
        self.inner
            .events
            .send(&PlayerEvent::StateChanged(PlayerState::Playing));
        self.start_timer(generation);
        Ok(())
    }

    fn pause(&self) {
        let paused = self.playback().state == PlayerState::Paused;
        self.set_pause(!paused);
    }

    fn set_pause(&self, pause: bool) {
        let state = self.playback().state;
        match (pause, state) {
            (true, PlayerState::Playing) => self.set_state(PlayerState::Paused),
            (false, PlayerState::Paused) => {
                if let Err(e) = self.play() {
                    debug!("Simulated resume failed: {}", e);
                }
            }
            _ => {}
        }
    }

    fn stop(&self) {
        {
            let mut playback = self.playback();
            playback.generation += 1;
            playback.state = PlayerState::Stopped;
        }
        self.inner
            .events
            .send(&PlayerEvent::StateChanged(PlayerState::Stopped));
    }

    fn state(&self) -> PlayerState {
        self.playback().state
    }

    fn event_manager(&self) -> &EventManager<PlayerEvent> {
        &self.inner.events
    }
}
