//! Reference-counted, internally locked list of media items

use super::Media;
use crate::error::{Error, Result};
use mlp_common::events::EventManager;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use uuid::Uuid;

/// Notifications sent by a [`MediaList`] to its observers
///
/// Sent after the list's lock has been released, on the mutating thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaListEvent {
    ItemAdded { index: usize, media_id: Uuid },
    ItemDeleted { index: usize, media_id: Uuid },
}

/// Ordered collection of media items
///
/// Cloning shares the same list. Each item may itself own a nested list
/// (see [`Media::subitems`]).
#[derive(Clone)]
pub struct MediaList {
    inner: Arc<MediaListInner>,
}

struct MediaListInner {
    items: Mutex<Vec<Media>>,
    read_only: AtomicBool,
    events: EventManager<MediaListEvent>,
}

/// Exclusive view of a media list
///
/// While held, no other thread can add or remove items in this list, so a
/// whole resolve-then-apply sequence sees a stable root. Nested lists keep
/// their own locks and are only locked briefly while being read.
///
/// Mutating the same list from the thread holding this guard deadlocks.
pub struct LockedMediaList<'a> {
    items: MutexGuard<'a, Vec<Media>>,
}

impl<'a> LockedMediaList<'a> {
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn item_at_index(&self, index: usize) -> Option<Media> {
        self.items.get(index).cloned()
    }

    pub fn index_of_item(&self, media: &Media) -> Option<usize> {
        self.items.iter().position(|item| item == media)
    }

    /// Items of the locked list, root level only
    pub fn items(&self) -> &[Media] {
        &self.items
    }
}

impl MediaList {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MediaListInner {
                items: Mutex::new(Vec::new()),
                read_only: AtomicBool::new(false),
                events: EventManager::new(),
            }),
        }
    }

    /// Build a list holding `items` in order
    pub fn from_media(items: impl IntoIterator<Item = Media>) -> Self {
        let list = Self::new();
        list.extend_unchecked(items);
        list
    }

    /// Append without read-only check or notifications (construction only)
    pub(crate) fn extend_unchecked(&self, items: impl IntoIterator<Item = Media>) {
        self.items().extend(items);
    }

    fn items(&self) -> MutexGuard<'_, Vec<Media>> {
        self.inner.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the list for a sequence of reads
    pub fn lock(&self) -> LockedMediaList<'_> {
        LockedMediaList { items: self.items() }
    }

    /// Append a media item
    pub fn add_media(&self, media: Media) -> Result<()> {
        self.check_writable()?;
        let event = {
            let mut items = self.items();
            let index = items.len();
            let media_id = media.id();
            items.push(media);
            MediaListEvent::ItemAdded { index, media_id }
        };
        self.inner.events.send(&event);
        Ok(())
    }

    /// Insert a media item at `index` (may equal the current count)
    pub fn insert_media(&self, media: Media, index: usize) -> Result<()> {
        self.check_writable()?;
        let event = {
            let mut items = self.items();
            if index > items.len() {
                return Err(Error::InvalidIndex {
                    index,
                    count: items.len(),
                });
            }
            let media_id = media.id();
            items.insert(index, media);
            MediaListEvent::ItemAdded { index, media_id }
        };
        self.inner.events.send(&event);
        Ok(())
    }

    /// Remove and return the media item at `index`
    pub fn remove_index(&self, index: usize) -> Result<Media> {
        self.check_writable()?;
        let removed = {
            let mut items = self.items();
            if index >= items.len() {
                return Err(Error::InvalidIndex {
                    index,
                    count: items.len(),
                });
            }
            items.remove(index)
        };
        debug!("Removed {} from media list at index {}", removed.mrl(), index);
        self.inner.events.send(&MediaListEvent::ItemDeleted {
            index,
            media_id: removed.id(),
        });
        Ok(removed)
    }

    pub fn count(&self) -> usize {
        self.items().len()
    }

    pub fn item_at_index(&self, index: usize) -> Option<Media> {
        self.items().get(index).cloned()
    }

    pub fn index_of_item(&self, media: &Media) -> Option<usize> {
        self.items().iter().position(|item| item == media)
    }

    pub fn is_read_only(&self) -> bool {
        self.inner.read_only.load(Ordering::Acquire)
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.inner.read_only.store(read_only, Ordering::Release);
    }

    /// Observer registration for [`MediaListEvent`]s
    pub fn event_manager(&self) -> &EventManager<MediaListEvent> {
        &self.inner.events
    }

    /// True if both handles refer to the same list
    pub fn ptr_eq(&self, other: &MediaList) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn check_writable(&self) -> Result<()> {
        if self.is_read_only() {
            return Err(Error::ReadOnly);
        }
        Ok(())
    }
}

impl Default for MediaList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MediaList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaList")
            .field("count", &self.count())
            .field("read_only", &self.is_read_only())
            .finish()
    }
}
