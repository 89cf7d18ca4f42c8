//! Media-list player
//!
//! Walks a tree of media lists and drives one underlying [`MediaPlayer`]
//! through it, one item at a time.
//!
//! # Locking
//!
//! Every instance owns two mutexes:
//! - the API lock, taken first by every public operation
//! - the callback lock, which owns the [`PlayerCore`] state
//!
//! Public operations take both (see [`Shared::lock`]); the advance worker
//! takes only the callback lock. The attached list's own lock is always
//! taken after both, then nested lists parent before child.
//!
//! The end-reached observer never takes any of these: it only posts to the
//! worker's work slot (see [`coordinator`]).

mod coordinator;
pub mod navigator;
pub mod path;

pub use path::MediaListPath;

use crate::config::PlayerSettings;
use crate::error::{Error, Result};
use crate::media::{Media, MediaList, MediaListEvent};
use crate::player::{MediaPlayer, PlayerEvent};
use coordinator::AdvanceSlot;
use mlp_common::events::{EventBus, ListPlayerEvent, ListenerId, PlaybackMode, PlayerState};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

/// Result of a successful advance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The item at this path was selected and handed to the player
    Playing(MediaListPath),
    /// The walk ran off the end of the list; selection cleared
    Exhausted,
}

struct AttachedList {
    list: MediaList,
    deleted_observer: ListenerId,
}

/// State guarded by the callback lock
pub(crate) struct PlayerCore {
    current_path: Option<MediaListPath>,
    list: Option<AttachedList>,
    player: Arc<dyn MediaPlayer>,
    end_reached_observer: Option<ListenerId>,
    mode: PlaybackMode,
}

/// Both locks held together
///
/// Field order matters: the callback lock is released before the API lock.
pub(crate) struct Locked<'a> {
    core: MutexGuard<'a, PlayerCore>,
    _api: MutexGuard<'a, ()>,
}

impl Deref for Locked<'_> {
    type Target = PlayerCore;

    fn deref(&self) -> &PlayerCore {
        &self.core
    }
}

impl DerefMut for Locked<'_> {
    fn deref_mut(&mut self) -> &mut PlayerCore {
        &mut self.core
    }
}

/// State shared between the public handles and the advance worker
pub(crate) struct Shared {
    api_lock: Mutex<()>,
    state: Mutex<PlayerCore>,
    work: AdvanceSlot,
    /// Bumped whenever the end-reached observer is detached or replaced
    observer_generation: AtomicU64,
    events: EventBus,
}

impl Shared {
    /// Take the API lock, then the callback lock
    fn lock(&self) -> Locked<'_> {
        let api = self.api_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let core = self.lock_callback();
        Locked { core, _api: api }
    }

    /// Take only the callback lock (advance worker)
    fn lock_callback(&self) -> MutexGuard<'_, PlayerCore> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn install_player_observer(self: &Arc<Self>, core: &mut PlayerCore) {
        let generation = self.observer_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let shared = Arc::downgrade(self);

        let id = core.player.event_manager().attach(move |event: &PlayerEvent| {
            if *event != PlayerEvent::EndReached {
                return;
            }
            let Some(shared) = shared.upgrade() else {
                return;
            };
            if shared.observer_generation.load(Ordering::SeqCst) != generation {
                trace!("Ignoring end reached from stale observer {}", generation);
                return;
            }
            trace!("End reached, queueing advance");
            shared.work.post(1);
        });

        core.end_reached_observer = Some(id);
    }

    fn uninstall_player_observer(&self, core: &mut PlayerCore) {
        self.observer_generation.fetch_add(1, Ordering::SeqCst);
        if let Some(id) = core.end_reached_observer.take() {
            core.player.event_manager().detach(id);
        }
    }

    /// Point the player at `media` without hearing its own end-of-media
    /// notification for the outgoing item
    fn retarget(self: &Arc<Self>, core: &mut PlayerCore, media: &Media) {
        self.uninstall_player_observer(core);
        core.player.set_media(media);
        self.install_player_observer(core);
    }

    /// Install `path`, start playback and announce the item
    fn select_and_play(
        self: &Arc<Self>,
        core: &mut PlayerCore,
        path: MediaListPath,
        item: &Media,
    ) -> AdvanceOutcome {
        debug!("Selecting {} at {}", item.mrl(), path);
        self.retarget(core, item);
        core.current_path = Some(path.clone());

        if let Err(e) = core.player.play() {
            warn!("Player failed to start {}: {}", item.mrl(), e);
        }

        self.events.emit_lossy(ListPlayerEvent::NextItemSet {
            media_id: item.id(),
            mrl: item.mrl().to_string(),
            path: path.indices().to_vec(),
            timestamp: chrono::Utc::now(),
        });

        AdvanceOutcome::Playing(path)
    }

    /// Move `offset` items from the current selection and play the result
    ///
    /// The attached list stays locked for the whole walk. Only the final
    /// path is handed to the player. A zero offset, or any offset in repeat
    /// mode, re-selects the current item (the first item when nothing is
    /// selected).
    fn advance(self: &Arc<Self>, core: &mut PlayerCore, offset: i32) -> Result<AdvanceOutcome> {
        let list = core
            .list
            .as_ref()
            .map(|attached| attached.list.clone())
            .ok_or(Error::NoMediaList)?;
        let locked = list.lock();
        let root = locked.items();

        let mut path = core.current_path.clone();

        if core.mode == PlaybackMode::Repeat || offset == 0 {
            if path.is_none() {
                path = navigator::next_path(root, None, false);
            }
        } else {
            let looping = core.mode == PlaybackMode::Loop;
            let mut steps = offset.unsigned_abs() as usize;
            if looping && steps > 1 {
                // Every full lap of the tree lands back on the same item
                let lap = navigator::item_count(root);
                if lap > 0 && steps > lap {
                    steps = lap + steps % lap;
                }
            }
            for _ in 0..steps {
                path = if offset > 0 {
                    navigator::next_path(root, path.as_ref(), looping)
                } else {
                    navigator::previous_path(root, path.as_ref(), looping)
                };
                match &path {
                    Some(step) => debug!("Advance step to {}", step),
                    None => break,
                }
            }
        }

        let resolved = path.and_then(|path| {
            let item = navigator::item_at_path(root, &path)?;
            Some((path, item))
        });

        match resolved {
            Some((path, item)) => Ok(self.select_and_play(core, path, &item)),
            None => {
                core.current_path = None;
                drop(locked);
                info!("End of media list reached");
                self.events.emit_lossy(ListPlayerEvent::ListPlayed {
                    timestamp: chrono::Utc::now(),
                });
                Ok(AdvanceOutcome::Exhausted)
            }
        }
    }
}

struct Inner {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shared.work.shutdown();

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = worker {
            // Dropped from a callback running on the worker, which already
            // holds the callback lock. Observers stay inert after shutdown.
            if handle.thread().id() == thread::current().id() {
                debug!("Released on the advance worker, not joining");
                return;
            }
            if handle.join().is_err() {
                warn!("Advance worker panicked");
            }
        }

        let mut core = self.shared.lock();
        self.shared.uninstall_player_observer(&mut core);
        if let Some(attached) = core.list.take() {
            attached.list.event_manager().detach(attached.deleted_observer);
        }
        core.current_path = None;

        info!("Media list player released");
    }
}

/// Plays a tree of media lists through one underlying player
///
/// Cloning yields another handle to the same player; the worker thread and
/// all observers are torn down when the last handle is dropped.
///
/// Mutating the attached list from inside an event handler that runs while
/// this player holds the list's lock deadlocks.
#[derive(Clone)]
pub struct MediaListPlayer {
    inner: Arc<Inner>,
}

impl MediaListPlayer {
    /// Create a player in default mode, announcing on `events`
    pub fn new(player: Arc<dyn MediaPlayer>, events: EventBus) -> Result<Self> {
        Self::spawn(player, events, &PlayerSettings::default())
    }

    /// Create a player whose event bus and worker follow `settings`
    pub fn with_settings(player: Arc<dyn MediaPlayer>, settings: &PlayerSettings) -> Result<Self> {
        Self::spawn(player, EventBus::new(settings.event_capacity), settings)
    }

    fn spawn(
        player: Arc<dyn MediaPlayer>,
        events: EventBus,
        settings: &PlayerSettings,
    ) -> Result<Self> {
        let shared = Arc::new(Shared {
            api_lock: Mutex::new(()),
            state: Mutex::new(PlayerCore {
                current_path: None,
                list: None,
                player,
                end_reached_observer: None,
                mode: settings.playback_mode,
            }),
            work: AdvanceSlot::new(),
            observer_generation: AtomicU64::new(0),
            events,
        });

        {
            let mut core = shared.lock();
            shared.install_player_observer(&mut core);
        }

        let worker = match coordinator::spawn(Arc::clone(&shared), &settings.worker_thread_name) {
            Ok(handle) => handle,
            Err(e) => {
                let mut core = shared.lock();
                shared.uninstall_player_observer(&mut core);
                return Err(e.into());
            }
        };

        info!(
            "Media list player created (mode={}, worker={})",
            settings.playback_mode, settings.worker_thread_name
        );

        Ok(Self {
            inner: Arc::new(Inner {
                shared,
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    fn shared(&self) -> &Arc<Shared> {
        &self.inner.shared
    }

    /// Receive this player's [`ListPlayerEvent`]s
    pub fn subscribe(&self) -> broadcast::Receiver<ListPlayerEvent> {
        self.shared().events.subscribe()
    }

    /// Attach `list`, replacing any previous list
    ///
    /// The current selection is kept; it is re-resolved against the new
    /// list on the next advance.
    pub fn set_media_list(&self, list: MediaList) {
        let mut core = self.shared().lock();

        if let Some(previous) = core.list.take() {
            previous.list.event_manager().detach(previous.deleted_observer);
        }

        let deleted_observer = list.event_manager().attach(|event: &MediaListEvent| {
            if let MediaListEvent::ItemDeleted { index, media_id } = event {
                debug!("Media {} deleted from list at index {}", media_id, index);
            }
        });

        debug!("Media list attached ({} root items)", list.count());
        core.list = Some(AttachedList {
            list,
            deleted_observer,
        });
    }

    /// Currently attached list
    pub fn media_list(&self) -> Option<MediaList> {
        let core = self.shared().lock();
        core.list.as_ref().map(|attached| attached.list.clone())
    }

    /// Swap the underlying player, moving the end-reached observer to it
    pub fn set_media_player(&self, player: Arc<dyn MediaPlayer>) {
        let mut core = self.shared().lock();
        self.shared().uninstall_player_observer(&mut core);
        core.player = player;
        self.shared().install_player_observer(&mut core);
        debug!("Underlying media player replaced");
    }

    pub fn media_player(&self) -> Arc<dyn MediaPlayer> {
        Arc::clone(&self.shared().lock().player)
    }

    /// Start playback
    ///
    /// With nothing selected this advances to the first item; otherwise the
    /// underlying player resumes the current one.
    pub fn play(&self) -> Result<()> {
        let mut core = self.shared().lock();
        if core.current_path.is_none() {
            self.shared().advance(&mut core, 1)?;
            return Ok(());
        }
        core.player.play()
    }

    /// Toggle pause on the underlying player
    pub fn pause(&self) {
        self.shared().lock().player.pause();
    }

    pub fn set_pause(&self, pause: bool) {
        self.shared().lock().player.set_pause(pause);
    }

    /// True while the underlying player is opening, buffering or playing
    pub fn is_playing(&self) -> bool {
        self.state().is_active()
    }

    /// State of the underlying player
    pub fn state(&self) -> PlayerState {
        self.shared().lock().player.state()
    }

    /// Play the `index`-th root item
    pub fn play_item_at_index(&self, index: usize) -> Result<()> {
        let shared = self.shared();
        let mut core = shared.lock();
        let list = core
            .list
            .as_ref()
            .map(|attached| attached.list.clone())
            .ok_or(Error::NoMediaList)?;
        let locked = list.lock();

        let item = locked.item_at_index(index).ok_or(Error::InvalidIndex {
            index,
            count: locked.count(),
        })?;

        shared.select_and_play(&mut core, MediaListPath::with_root_index(index), &item);
        Ok(())
    }

    /// Play `media`, located anywhere in the list tree by identity
    pub fn play_item(&self, media: &Media) -> Result<()> {
        let shared = self.shared();
        let mut core = shared.lock();
        let list = core
            .list
            .as_ref()
            .map(|attached| attached.list.clone())
            .ok_or(Error::NoMediaList)?;
        let locked = list.lock();

        let Some(path) = navigator::path_of_item(locked.items(), media) else {
            warn!("{} is not in the attached media list", media.mrl());
            return Err(Error::ItemNotFound(media.mrl().to_string()));
        };

        shared.select_and_play(&mut core, path, media);
        Ok(())
    }

    /// Advance one item forward
    pub fn next(&self) -> Result<AdvanceOutcome> {
        self.advance(1)
    }

    /// Advance one item backward
    pub fn previous(&self) -> Result<AdvanceOutcome> {
        self.advance(-1)
    }

    /// Move `offset` items (negative = backward) and play the result
    pub fn advance(&self, offset: i32) -> Result<AdvanceOutcome> {
        let mut core = self.shared().lock();
        self.shared().advance(&mut core, offset)
    }

    /// Queue an advance for the worker thread
    ///
    /// Safe to call from inside an underlying player's callback, where
    /// [`advance`](Self::advance) would deadlock.
    pub fn request_advance(&self, offset: i32) {
        self.shared().work.post(offset);
    }

    pub fn set_playback_mode(&self, mode: PlaybackMode) {
        let mut core = self.shared().lock();
        if core.mode != mode {
            info!("Playback mode: {} -> {}", core.mode, mode);
            core.mode = mode;
        }
    }

    pub fn playback_mode(&self) -> PlaybackMode {
        self.shared().lock().mode
    }

    pub fn current_path(&self) -> Option<MediaListPath> {
        self.shared().lock().current_path.clone()
    }

    /// Media at the current path, if any
    pub fn current_item(&self) -> Option<Media> {
        let core = self.shared().lock();
        let path = core.current_path.as_ref()?;
        let list = core.list.as_ref()?.list.clone();
        let locked = list.lock();
        navigator::item_at_path(locked.items(), path)
    }

    /// Stop the underlying player and clear the selection
    ///
    /// The end-reached observer is detached around the stop so a player
    /// reporting end-of-media while stopping does not trigger an advance.
    /// Pending deferred advances are cancelled.
    pub fn stop(&self) {
        let shared = self.shared();
        let mut core = shared.lock();

        let dropped = shared.work.clear();
        if dropped != 0 {
            debug!("Stop cancelled pending advance of {}", dropped);
        }

        shared.uninstall_player_observer(&mut core);
        core.player.stop();
        shared.install_player_observer(&mut core);

        core.current_path = None;
        drop(core);

        info!("Media list player stopped");
        shared.events.emit_lossy(ListPlayerEvent::Stopped {
            timestamp: chrono::Utc::now(),
        });
    }

    /// Drop this handle
    ///
    /// The last released handle stops the worker thread and detaches every
    /// observer before the player and list are dropped.
    pub fn release(self) {
        drop(self);
    }
}

impl std::fmt::Debug for MediaListPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaListPlayer")
            .field("handles", &Arc::strong_count(&self.inner))
            .field("events", &self.shared().events)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::SimulatedPlayer;
    use std::time::Duration;

    fn player() -> Arc<dyn MediaPlayer> {
        Arc::new(SimulatedPlayer::new(Duration::from_secs(3600)))
    }

    fn flat(mrls: &[&str]) -> MediaList {
        MediaList::from_media(mrls.iter().map(|mrl| Media::new(*mrl)))
    }

    #[test]
    fn test_advance_without_list() {
        let mlp = MediaListPlayer::new(player(), EventBus::new(8)).unwrap();
        assert!(matches!(mlp.next(), Err(Error::NoMediaList)));
        assert!(matches!(mlp.play(), Err(Error::NoMediaList)));
        assert!(matches!(mlp.play_item_at_index(0), Err(Error::NoMediaList)));
    }

    #[test]
    fn test_play_selects_first_item() {
        let mlp = MediaListPlayer::new(player(), EventBus::new(8)).unwrap();
        mlp.set_media_list(flat(&["a", "b"]));

        mlp.play().unwrap();
        assert_eq!(mlp.current_path(), Some(MediaListPath::with_root_index(0)));
        assert_eq!(mlp.current_item().map(|m| m.mrl().to_string()), Some("a".to_string()));
        assert!(mlp.is_playing());
    }

    #[test]
    fn test_zero_offset_reselects_current() {
        let mlp = MediaListPlayer::new(player(), EventBus::new(8)).unwrap();
        mlp.set_media_list(flat(&["a", "b"]));

        mlp.play_item_at_index(1).unwrap();
        let outcome = mlp.advance(0).unwrap();
        assert_eq!(outcome, AdvanceOutcome::Playing(MediaListPath::with_root_index(1)));
    }

    #[test]
    fn test_invalid_index_leaves_state_untouched() {
        let mlp = MediaListPlayer::new(player(), EventBus::new(8)).unwrap();
        mlp.set_media_list(flat(&["a"]));
        mlp.play_item_at_index(0).unwrap();

        assert!(matches!(
            mlp.play_item_at_index(4),
            Err(Error::InvalidIndex { index: 4, count: 1 })
        ));
        assert_eq!(mlp.current_path(), Some(MediaListPath::with_root_index(0)));
    }

    #[test]
    fn test_set_media_player_moves_observer() {
        let first = Arc::new(SimulatedPlayer::new(Duration::from_secs(3600)));
        let second = Arc::new(SimulatedPlayer::new(Duration::from_secs(3600)));
        let mlp = MediaListPlayer::new(first.clone(), EventBus::new(8)).unwrap();
        assert_eq!(first.event_manager().listener_count(), 1);

        mlp.set_media_player(second.clone());
        assert_eq!(first.event_manager().listener_count(), 0);
        assert_eq!(second.event_manager().listener_count(), 1);

        drop(mlp);
        assert_eq!(second.event_manager().listener_count(), 0);
    }

    #[test]
    fn test_playback_mode_from_settings() {
        let settings = PlayerSettings {
            playback_mode: PlaybackMode::Loop,
            ..PlayerSettings::default()
        };
        let mlp = MediaListPlayer::with_settings(player(), &settings).unwrap();
        assert_eq!(mlp.playback_mode(), PlaybackMode::Loop);

        mlp.set_playback_mode(PlaybackMode::Repeat);
        assert_eq!(mlp.playback_mode(), PlaybackMode::Repeat);
    }

    #[test]
    fn test_with_settings_sizes_event_bus() {
        let settings = PlayerSettings {
            event_capacity: 7,
            ..PlayerSettings::default()
        };
        let mlp = MediaListPlayer::with_settings(player(), &settings).unwrap();
        assert_eq!(mlp.shared().events.capacity(), 7);
    }

    fn wait_until(what: &str, condition: impl Fn() -> bool) {
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while !condition() {
            assert!(std::time::Instant::now() < deadline, "timed out waiting for {}", what);
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_release_drops_offset_taken_before_shutdown() {
        let mlp = MediaListPlayer::new(player(), EventBus::new(8)).unwrap();
        mlp.set_media_list(flat(&["a", "b"]));
        let mut rx = mlp.subscribe();
        mlp.play_item_at_index(0).unwrap();
        assert!(rx.try_recv().is_ok());

        let shared = Arc::clone(mlp.shared());
        let core = shared.lock_callback();

        // The worker takes the offset, then blocks on the callback lock
        mlp.request_advance(1);
        wait_until("worker to take the offset", || shared.work.pending() == 0);

        let releaser = thread::spawn(move || mlp.release());
        wait_until("shutdown to be signalled", || shared.work.is_shutdown());
        drop(core);

        releaser.join().unwrap();
        assert!(
            rx.try_recv().is_err(),
            "no item may be selected once release has begun"
        );
        assert!(shared.lock_callback().current_path.is_none());
    }

    #[test]
    fn test_list_observer_moves_with_list() {
        let mlp = MediaListPlayer::new(player(), EventBus::new(8)).unwrap();
        let first = flat(&["a"]);
        let second = flat(&["b"]);

        mlp.set_media_list(first.clone());
        assert_eq!(first.event_manager().listener_count(), 1);

        mlp.set_media_list(second.clone());
        assert_eq!(first.event_manager().listener_count(), 0);
        assert_eq!(second.event_manager().listener_count(), 1);
        assert!(mlp.media_list().is_some_and(|l| l.ptr_eq(&second)));

        mlp.release();
        assert_eq!(second.event_manager().listener_count(), 0);
    }
}
