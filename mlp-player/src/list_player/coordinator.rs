//! Deferred advance worker
//!
//! The underlying player reports "end reached" from its own internal
//! thread, and that player must not be called back from inside its own
//! notification. The notification therefore only records a pending offset
//! in a single-slot work queue; a dedicated worker thread picks the offset
//! up and performs the advance under the callback lock.
//!
//! The slot has its own small mutex that is never held while another lock
//! is acquired, so posting work cannot block on anything the player's
//! thread might be waiting for.

use super::Shared;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct SlotState {
    /// Accumulated relative position change, positive = forward
    offset: i32,
    shutdown: bool,
    /// Bumped by `clear()`; work taken under an older epoch is void
    epoch: u64,
}

/// Offset taken from the slot, tagged with the epoch it was taken in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Work {
    offset: i32,
    epoch: u64,
}

/// Single-slot work queue: an accumulated offset plus a condition variable
#[derive(Debug, Default)]
pub(crate) struct AdvanceSlot {
    state: Mutex<SlotState>,
    wakeup: Condvar,
}

impl AdvanceSlot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add `delta` to the pending offset and wake the worker
    ///
    /// Ignored once shutdown has been signalled.
    pub(crate) fn post(&self, delta: i32) {
        let mut state = self.state();
        if state.shutdown {
            debug!("Ignoring deferred advance of {} after shutdown", delta);
            return;
        }
        state.offset = state.offset.saturating_add(delta);
        debug!("Deferred advance posted: delta={}, pending={}", delta, state.offset);
        self.wakeup.notify_one();
    }

    /// Drop any pending offset, returning it
    ///
    /// Also voids an offset the worker has already taken but not yet
    /// applied.
    pub(crate) fn clear(&self) -> i32 {
        let mut state = self.state();
        state.epoch = state.epoch.wrapping_add(1);
        std::mem::take(&mut state.offset)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.state().epoch == epoch
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> i32 {
        self.state().offset
    }

    pub(crate) fn shutdown(&self) {
        self.state().shutdown = true;
        self.wakeup.notify_all();
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.state().shutdown
    }

    /// Block until there is a non-zero offset to process or shutdown
    ///
    /// Returns the taken offset, or `None` on shutdown. Shutdown wins over
    /// pending work.
    fn wait_for_work(&self) -> Option<Work> {
        let mut state = self.state();
        loop {
            if state.shutdown {
                return None;
            }
            if state.offset != 0 {
                return Some(Work {
                    offset: std::mem::take(&mut state.offset),
                    epoch: state.epoch,
                });
            }
            state = self
                .wakeup
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Spawn the worker thread for `shared`
pub(crate) fn spawn(shared: Arc<Shared>, name: &str) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || worker_loop(shared))
}

fn worker_loop(shared: Arc<Shared>) {
    debug!("Advance worker started");

    while let Some(Work { offset, epoch }) = shared.work.wait_for_work() {
        let mut core = shared.lock_callback();

        // Release or stop may have run while this thread waited for the lock
        if shared.work.is_shutdown() {
            debug!("Advance worker dropping offset {} on shutdown", offset);
            break;
        }
        if !shared.work.is_current(epoch) {
            debug!("Deferred advance of {} cancelled", offset);
            continue;
        }

        match shared.advance(&mut core, offset) {
            Ok(outcome) => debug!("Deferred advance of {} finished: {:?}", offset, outcome),
            Err(e) => warn!("Deferred advance of {} failed: {}", offset, e),
        }
    }

    info!("Advance worker exiting");
}
