//! Synchronous observer fan-out
//!
//! `EventManager` is the attach/detach/send primitive used by media lists
//! and underlying players to notify observers. Unlike [`super::EventBus`],
//! delivery is synchronous: `send()` calls every attached listener on the
//! sending thread before returning.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

/// Handle returned by [`EventManager::attach`], used to detach later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Observer registry for events of type `E`
pub struct EventManager<E> {
    listeners: Mutex<Vec<(ListenerId, Listener<E>)>>,
    next_id: AtomicU64,
}

impl<E> EventManager<E> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Attach a listener. It will be called for every event sent after this
    /// returns.
    pub fn attach<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        trace!("Attached listener {:?}", id);
        id
    }

    /// Detach a listener. Returns false if it was not attached.
    ///
    /// A `send()` already in flight on another thread may still deliver one
    /// last event to the detached listener.
    pub fn detach(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        let removed = listeners.len() != before;
        trace!("Detached listener {:?} (found={})", id, removed);
        removed
    }

    /// Deliver `event` to every attached listener
    ///
    /// The listener list is snapshotted first so listeners may attach or
    /// detach from inside their callback.
    pub fn send(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl<E> Default for EventManager<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventManager<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
