//! Index paths into a tree of media lists
//!
//! A path is the root-to-leaf sequence of indices that locates an item:
//! `[2, 0, 1]` is the root's third item, its first sub-item, and that one's
//! second sub-item. Paths are plain values; navigation always builds a new
//! path rather than editing one in place. "Nothing selected" is expressed as
//! `Option::<MediaListPath>::None`, never as a special path.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MediaListPath {
    indices: Vec<usize>,
}

impl MediaListPath {
    /// Path of depth 0
    pub fn empty() -> Self {
        Self::default()
    }

    /// `[index]`
    pub fn with_root_index(index: usize) -> Self {
        Self {
            indices: vec![index],
        }
    }

    pub fn depth(&self) -> usize {
        self.indices.len()
    }

    /// New path with `index` appended; `self` is untouched
    pub fn copy_by_appending(&self, index: usize) -> Self {
        let mut indices = Vec::with_capacity(self.indices.len() + 1);
        indices.extend_from_slice(&self.indices);
        indices.push(index);
        Self { indices }
    }

    /// Path of the enclosing item, `None` for the empty path
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.indices.split_last()?;
        Some(Self {
            indices: parent.to_vec(),
        })
    }

    /// Index within the innermost list
    pub fn last(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl From<Vec<usize>> for MediaListPath {
    fn from(indices: Vec<usize>) -> Self {
        Self { indices }
    }
}

impl From<&[usize]> for MediaListPath {
    fn from(indices: &[usize]) -> Self {
        Self {
            indices: indices.to_vec(),
        }
    }
}

/// Formats as `/2/0/1`; the empty path is `/`
impl fmt::Display for MediaListPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.indices.is_empty() {
            return write!(f, "/");
        }
        for index in &self.indices {
            write!(f, "/{}", index)?;
        }
        Ok(())
    }
}
