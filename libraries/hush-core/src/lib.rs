//! Hush Core
//!
//! Platform-agnostic types, catalog and settings storage for Hush.
//!
//! This crate provides the building blocks shared by the playback engine and
//! the applications:
//! - **Domain Types**: `Sound`, `Preset`, `TimerOption`, saved track settings
//! - **Catalog**: built-in sounds and mixes, loadable from JSON
//! - **Storage**: a string key-value contract and a typed settings repository
//! - **Error Handling**: unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use hush_core::{Catalog, MemoryStore, SettingsRepository};
//!
//! let catalog = Catalog::builtin();
//! let rain = catalog.sound("rain").expect("rain is built in");
//! assert_eq!(rain.name, "Rain");
//!
//! let repo = SettingsRepository::new(MemoryStore::new());
//! assert!(repo.load_track_settings().unwrap().is_empty());
//! ```

#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use catalog::Catalog;
pub use error::{CoreError, Result};
pub use storage::{FileStore, KeyValueStore, MemoryStore, SettingsRepository};
pub use types::{
    Preset, PresetSound, SavedTrack, SavedTrackSettings, Sound, SoundCategory, SoundId,
    TimerOption, MAX_PRESET_SOUNDS,
};
