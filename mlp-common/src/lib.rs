//! # Media List Player Common Library
//!
//! Shared code for the media-list player crates:
//! - Error types
//! - Event types (ListPlayerEvent), the broadcast EventBus and the
//!   synchronous observer EventManager
//! - TOML bootstrap configuration

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
