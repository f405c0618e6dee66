//! Settings persistence
//!
//! Persistence is modelled as a plain string key-value store (the shape of
//! browser local storage or a preferences file) with a typed repository on
//! top that owns the key names and the JSON encoding.

use crate::error::{CoreError, Result};
use crate::types::{Preset, SavedTrackSettings};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Key holding the sound id → saved settings map
pub const TRACK_SETTINGS_KEY: &str = "hush.trackSettings";

/// Key holding the custom preset collection
pub const CUSTOM_MIXES_KEY: &str = "hush.customMixes";

/// String key-value store
pub trait KeyValueStore: Send {
    /// Read a value, `Ok(None)` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete a value (no-op if missing)
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store
///
/// Clones share the same map, so a test can keep one handle while the
/// session owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Directory-backed store, one `<key>.json` file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
        if !valid || key.starts_with('.') {
            return Err(CoreError::invalid_input(format!(
                "invalid storage key '{}'",
                key
            )));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        // Write then rename so a crash never leaves a half-written file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Typed access to the persisted playback settings and custom presets
pub struct SettingsRepository {
    store: Box<dyn KeyValueStore>,
}

impl SettingsRepository {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Load saved track settings (empty if never written)
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the entry is malformed
    pub fn load_track_settings(&self) -> Result<SavedTrackSettings> {
        match self.store.get(TRACK_SETTINGS_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(SavedTrackSettings::new()),
        }
    }

    /// Persist saved track settings
    pub fn save_track_settings(&mut self, settings: &SavedTrackSettings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        self.store.set(TRACK_SETTINGS_KEY, &json)
    }

    /// Load the custom preset collection (empty if never written)
    pub fn load_custom_mixes(&self) -> Result<Vec<Preset>> {
        match self.store.get(CUSTOM_MIXES_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Persist the whole custom preset collection
    pub fn save_custom_mixes(&mut self, mixes: &[Preset]) -> Result<()> {
        let json = serde_json::to_string(mixes)?;
        self.store.set(CUSTOM_MIXES_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SavedTrack, SoundId};

    #[test]
    fn memory_store_clones_share_entries() {
        let mut store = MemoryStore::new();
        let observer = store.clone();

        store.set("a", "1").unwrap();
        assert_eq!(observer.get("a").unwrap().as_deref(), Some("1"));

        store.remove("a").unwrap();
        assert!(observer.get("a").unwrap().is_none());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let store = FileStore::new("/tmp/unused");
        assert!(store.get("../etc/passwd").is_err());
        assert!(store.get("").is_err());
        assert!(store.get(".hidden").is_err());
    }

    #[test]
    fn repository_round_trips_settings() {
        let store = MemoryStore::new();
        let mut repo = SettingsRepository::new(store.clone());

        assert!(repo.load_track_settings().unwrap().is_empty());

        let mut settings = SavedTrackSettings::new();
        settings.insert(
            SoundId::new("rain"),
            SavedTrack {
                volume: 50.0,
                was_playing: true,
            },
        );
        repo.save_track_settings(&settings).unwrap();

        assert_eq!(repo.load_track_settings().unwrap(), settings);
        assert!(store.get(TRACK_SETTINGS_KEY).unwrap().is_some());
    }

    #[test]
    fn repository_reports_malformed_entries() {
        let mut store = MemoryStore::new();
        store.set(TRACK_SETTINGS_KEY, "{not json").unwrap();
        store.set(CUSTOM_MIXES_KEY, "42").unwrap();

        let repo = SettingsRepository::new(store);
        assert!(matches!(
            repo.load_track_settings(),
            Err(CoreError::Serialization(_))
        ));
        assert!(repo.load_custom_mixes().is_err());
    }
}
