//! Media items and media lists
//!
//! A [`Media`] is a cheap, reference-counted handle. Each media owns a
//! sub-item [`MediaList`], so a root list forms a tree: playlists containing
//! sub-playlists containing sub-playlists. Children never point back at
//! their parent; parent lookups walk down from the root.

mod list;

pub use list::{LockedMediaList, MediaList, MediaListEvent};

use std::sync::Arc;
use uuid::Uuid;

/// A playable media item
///
/// Cloning shares the same item. Equality is identity: two handles are
/// equal when they refer to the same item, regardless of MRL.
#[derive(Clone)]
pub struct Media {
    inner: Arc<MediaInner>,
}

struct MediaInner {
    id: Uuid,
    mrl: String,
    subitems: MediaList,
}

impl Media {
    /// Create a media item with an empty sub-item list
    pub fn new(mrl: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(MediaInner {
                id: Uuid::new_v4(),
                mrl: mrl.into(),
                subitems: MediaList::new(),
            }),
        }
    }

    /// Create a media item whose sub-item list holds `children`
    pub fn with_subitems(mrl: impl Into<String>, children: impl IntoIterator<Item = Media>) -> Self {
        let media = Self::new(mrl);
        media.inner.subitems.extend_unchecked(children);
        media
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Media resource locator
    pub fn mrl(&self) -> &str {
        &self.inner.mrl
    }

    /// The sub-item list owned by this media (possibly empty)
    pub fn subitems(&self) -> &MediaList {
        &self.inner.subitems
    }

    /// The sub-item list, only if it has at least one item
    ///
    /// An empty sub-list counts as no sub-list at all.
    pub fn populated_subitems(&self) -> Option<&MediaList> {
        let subitems = &self.inner.subitems;
        (subitems.count() > 0).then_some(subitems)
    }
}

impl PartialEq for Media {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Media {}

impl std::hash::Hash for Media {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl std::fmt::Debug for Media {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Media")
            .field("id", &self.inner.id)
            .field("mrl", &self.inner.mrl)
            .field("subitems", &self.inner.subitems.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_identity() {
        let a = Media::new("file:///a.ogg");
        let a2 = a.clone();
        let other = Media::new("file:///a.ogg");

        assert_eq!(a, a2);
        assert_ne!(a, other, "same MRL is not the same item");
        assert_eq!(a.id(), a2.id());
    }

    #[test]
    fn test_empty_subitems_count_as_none() {
        let leaf = Media::new("file:///leaf.ogg");
        assert!(leaf.populated_subitems().is_none());
        assert_eq!(leaf.subitems().count(), 0);

        let parent = Media::with_subitems("file:///dir", vec![Media::new("file:///x.ogg")]);
        assert_eq!(parent.populated_subitems().map(|l| l.count()), Some(1));
    }
}
