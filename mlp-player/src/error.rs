//! Error types for mlp-player
//!
//! Running off the end of a list is not an error: it is reported as
//! [`crate::list_player::AdvanceOutcome::Exhausted`].

use thiserror::Error;

/// Main error type for mlp-player
#[derive(Error, Debug)]
pub enum Error {
    /// An operation that walks the list was called before any list was attached
    #[error("No media list attached")]
    NoMediaList,

    /// The requested media is not part of the attached list tree
    #[error("Item not found in media list: {0}")]
    ItemNotFound(String),

    /// Index outside the list
    #[error("Index {index} out of range for list of {count} items")]
    InvalidIndex { index: usize, count: usize },

    /// Mutation attempted on a read-only media list
    #[error("Media list is read-only")]
    ReadOnly,

    /// The underlying media player refused an operation
    #[error("Player error: {0}")]
    Player(String),

    /// Thread spawn or other OS-level failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from the shared library (configuration, ...)
    #[error(transparent)]
    Common(#[from] mlp_common::Error),
}

/// Convenience Result type using mlp-player Error
pub type Result<T> = std::result::Result<T, Error>;
