//! Next/previous resolution over a tree of media lists
//!
//! Every function here is pure: it reads the tree and returns a new path.
//! `root` is the item slice of the locked root list; nested lists are
//! queried on demand, with no caching, so results are only meaningful while
//! the caller keeps the root locked for the whole resolve-and-apply
//! sequence.
//!
//! A media whose sub-list is empty is treated exactly like a media without
//! a sub-list.

use super::path::MediaListPath;
use crate::media::{Media, MediaList};

/// Media addressed by `path`, if it exists
pub fn item_at_path(root: &[Media], path: &MediaListPath) -> Option<Media> {
    let (&first, rest) = path.indices().split_first()?;
    let mut item = root.get(first)?.clone();
    for &index in rest {
        item = item.subitems().item_at_index(index)?;
    }
    Some(item)
}

/// Non-empty sub-list of the media addressed by `path`
pub fn sublist_at_path(root: &[Media], path: &MediaListPath) -> Option<MediaList> {
    item_at_path(root, path)?.populated_subitems().cloned()
}

/// Number of items in the list that contains the last index of `path`
///
/// `None` for the empty path or when an enclosing item no longer exists.
fn parent_count_at_path(root: &[Media], path: &MediaListPath) -> Option<usize> {
    match path.depth() {
        0 => None,
        1 => Some(root.len()),
        _ => {
            let parent = item_at_path(root, &path.parent()?)?;
            Some(parent.subitems().count())
        }
    }
}

/// First item of a non-empty tree
fn first_path(root: &[Media]) -> Option<MediaListPath> {
    (!root.is_empty()).then(|| MediaListPath::with_root_index(0))
}

/// Path following `current` in depth-first order
///
/// - no current path: the first root item
/// - current item has a populated sub-list: descend into its first child
/// - otherwise the next sibling, climbing to the enclosing list while the
///   current list is exhausted
///
/// Running off the end of the root list yields `None`, or the first root
/// item when `looping`.
pub fn next_path(
    root: &[Media],
    current: Option<&MediaListPath>,
    looping: bool,
) -> Option<MediaListPath> {
    let Some(current) = current else {
        return first_path(root);
    };

    // An item that just gained children is entered before moving on
    if sublist_at_path(root, current).is_some() {
        return Some(current.copy_by_appending(0));
    }

    let mut parent_count = parent_count_at_path(root, current)?;
    let mut indices = current.indices().to_vec();
    *indices.last_mut()? += 1;

    while *indices.last()? >= parent_count {
        indices.pop();
        if indices.is_empty() {
            return if looping { first_path(root) } else { None };
        }
        *indices.last_mut()? += 1;
        parent_count = parent_count_at_path(root, &MediaListPath::from(indices.as_slice()))?;
    }

    Some(MediaListPath::from(indices))
}

/// Deepest last descendant of the item at `path`
///
/// Returns `path` itself when the item has no populated sub-list.
pub fn find_last_item(root: &[Media], path: MediaListPath) -> MediaListPath {
    let mut path = path;
    while let Some(sublist) = sublist_at_path(root, &path) {
        match sublist.count().checked_sub(1) {
            Some(last) => path = path.copy_by_appending(last),
            None => break,
        }
    }
    path
}

/// Path preceding `current` in depth-first order
///
/// The mirror of [`next_path`]: the previous sibling's deepest last
/// descendant, or the enclosing item when `current` is a first child.
/// Moving before the first root item yields `None`, or the deepest last
/// descendant of the last root item when `looping`.
pub fn previous_path(
    root: &[Media],
    current: Option<&MediaListPath>,
    looping: bool,
) -> Option<MediaListPath> {
    let Some(current) = current else {
        return first_path(root);
    };

    let parent_count = parent_count_at_path(root, current)?;
    // A list that shrank under `current` steps back onto its last item
    let last = current.last()?.min(parent_count);

    if last == 0 {
        if current.depth() > 1 {
            return current.parent();
        }
        if !looping {
            return None;
        }
        let last_root = parent_count.checked_sub(1)?;
        return Some(find_last_item(root, MediaListPath::with_root_index(last_root)));
    }

    let sibling = current.parent()?.copy_by_appending(last - 1);
    Some(find_last_item(root, sibling))
}

/// Number of items in the whole tree, nested items included
///
/// This is the length of one full cycle of [`next_path`] with looping.
pub fn item_count(root: &[Media]) -> usize {
    root.iter()
        .map(|item| {
            1 + item
                .populated_subitems()
                .map_or(0, |sublist| item_count(sublist.lock().items()))
        })
        .sum()
}

/// Depth-first identity search for `media` anywhere in the tree
pub fn path_of_item(root: &[Media], media: &Media) -> Option<MediaListPath> {
    find_in(root, media, &MediaListPath::empty())
}

fn find_in(items: &[Media], media: &Media, prefix: &MediaListPath) -> Option<MediaListPath> {
    for (index, item) in items.iter().enumerate() {
        let path = prefix.copy_by_appending(index);
        if item == media {
            return Some(path);
        }
        if let Some(sublist) = item.populated_subitems() {
            let locked = sublist.lock();
            if let Some(found) = find_in(locked.items(), media, &path) {
                return Some(found);
            }
        }
    }
    None
}
