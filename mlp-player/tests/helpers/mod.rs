//! Shared fixtures for mlp-player integration tests
//!
//! Provides a scriptable mock player, tree builders and event helpers.

#![allow(dead_code)]

use mlp_common::events::{EventManager, ListPlayerEvent, PlayerState};
use mlp_player::{Media, MediaList, MediaPlayer, PlayerEvent, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;

/// How long tests wait for something that should happen
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

/// How long tests wait to be confident something did NOT happen
pub const QUIET_PERIOD: Duration = Duration::from_millis(150);

#[derive(Default)]
struct MockState {
    media: Option<Media>,
    state: PlayerState,
    targets: Vec<String>,
    play_calls: usize,
    stop_calls: usize,
    observers_during_stop: Vec<usize>,
}

/// Mock underlying player
///
/// Never plays anything by itself; tests call [`MockPlayer::reach_end`] to
/// simulate the end of the current media.
#[derive(Default)]
pub struct MockPlayer {
    state: Mutex<MockState>,
    events: EventManager<PlayerEvent>,
    /// Report end reached synchronously from inside `stop()`
    pub end_on_stop: AtomicBool,
    /// Report end reached synchronously from inside `play()`
    pub end_on_play: AtomicBool,
    /// Make `play()` fail
    pub fail_play: AtomicBool,
}

impl MockPlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Simulate the engine's thread reporting end of media
    pub fn reach_end(&self) {
        self.state.lock().unwrap().state = PlayerState::Ended;
        self.events.send(&PlayerEvent::EndReached);
    }

    /// MRLs passed to `set_media`, in call order
    pub fn targets(&self) -> Vec<String> {
        self.state.lock().unwrap().targets.clone()
    }

    pub fn play_calls(&self) -> usize {
        self.state.lock().unwrap().play_calls
    }

    pub fn stop_calls(&self) -> usize {
        self.state.lock().unwrap().stop_calls
    }

    /// Number of attached observers seen at each `stop()` call
    pub fn observers_during_stop(&self) -> Vec<usize> {
        self.state.lock().unwrap().observers_during_stop.clone()
    }

    pub fn observer_count(&self) -> usize {
        self.events.listener_count()
    }
}

impl MediaPlayer for MockPlayer {
    fn set_media(&self, media: &Media) {
        let mut state = self.state.lock().unwrap();
        state.targets.push(media.mrl().to_string());
        state.media = Some(media.clone());
        state.state = PlayerState::NothingSpecial;
    }

    fn media(&self) -> Option<Media> {
        self.state.lock().unwrap().media.clone()
    }

    fn play(&self) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.play_calls += 1;
            if self.fail_play.load(Ordering::SeqCst) {
                state.state = PlayerState::Error;
                return Err(mlp_player::Error::Player("mock play failure".to_string()));
            }
            state.state = PlayerState::Playing;
        }
        if self.end_on_play.load(Ordering::SeqCst) {
            self.reach_end();
        }
        Ok(())
    }

    fn pause(&self) {
        let mut state = self.state.lock().unwrap();
        state.state = match state.state {
            PlayerState::Paused => PlayerState::Playing,
            PlayerState::Playing => PlayerState::Paused,
            other => other,
        };
    }

    fn set_pause(&self, pause: bool) {
        let mut state = self.state.lock().unwrap();
        state.state = match (pause, state.state) {
            (true, PlayerState::Playing) => PlayerState::Paused,
            (false, PlayerState::Paused) => PlayerState::Playing,
            (_, other) => other,
        };
    }

    fn stop(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.stop_calls += 1;
            state.observers_during_stop.push(self.events.listener_count());
            state.state = PlayerState::Stopped;
        }
        if self.end_on_stop.load(Ordering::SeqCst) {
            self.events.send(&PlayerEvent::EndReached);
        }
    }

    fn state(&self) -> PlayerState {
        self.state.lock().unwrap().state
    }

    fn event_manager(&self) -> &EventManager<PlayerEvent> {
        &self.events
    }
}

/// Flat list of media with the given MRLs
pub fn flat_list(mrls: &[&str]) -> MediaList {
    MediaList::from_media(mrls.iter().map(|mrl| Media::new(*mrl)))
}

/// `[A, B(B1, B2), C]`
pub fn nested_list() -> MediaList {
    MediaList::from_media(vec![
        Media::new("A"),
        Media::with_subitems("B", vec![Media::new("B1"), Media::new("B2")]),
        Media::new("C"),
    ])
}

/// Wait up to `timeout` for the next event
pub fn recv_event(
    rx: &mut Receiver<ListPlayerEvent>,
    timeout: Duration,
) -> Option<ListPlayerEvent> {
    let deadline = Instant::now() + timeout;
    loop {
        match rx.try_recv() {
            Ok(event) => return Some(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Closed) => return None,
            Err(TryRecvError::Empty) => {
                if Instant::now() >= deadline {
                    return None;
                }
                thread::sleep(Duration::from_millis(5));
            }
        }
    }
}

/// Wait for the first event matching `predicate`, skipping others
pub fn wait_for_event<F>(
    rx: &mut Receiver<ListPlayerEvent>,
    timeout: Duration,
    predicate: F,
) -> Option<ListPlayerEvent>
where
    F: Fn(&ListPlayerEvent) -> bool,
{
    let deadline = Instant::now() + timeout;
    while let Some(event) = recv_event(rx, deadline.saturating_duration_since(Instant::now())) {
        if predicate(&event) {
            return Some(event);
        }
    }
    None
}

/// Every event already queued, without waiting
pub fn drain_events(rx: &mut Receiver<ListPlayerEvent>) -> Vec<ListPlayerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Event types in order, for compact assertions
pub fn event_types(events: &[ListPlayerEvent]) -> Vec<&str> {
    events.iter().map(|event| event.event_type()).collect()
}

/// MRLs announced by `NextItemSet` events, in order
pub fn announced_mrls(events: &[ListPlayerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            ListPlayerEvent::NextItemSet { mrl, .. } => Some(mrl.clone()),
            _ => None,
        })
        .collect()
}
