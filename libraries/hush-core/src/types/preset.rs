/// Preset ("mix") types
use crate::error::{CoreError, Result};
use crate::types::SoundId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum number of sounds a preset may list (same as the concurrent track limit)
pub const MAX_PRESET_SOUNDS: usize = 3;

/// One sound in a preset with its normalized volume (0.0 - 1.0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetSound {
    pub id: SoundId,
    pub volume: f32,
}

impl PresetSound {
    pub fn new(id: impl Into<SoundId>, volume: f32) -> Self {
        Self {
            id: id.into(),
            volume,
        }
    }
}

/// A named, ordered set of sounds applied in one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Unique name (custom presets are keyed by it)
    pub name: String,

    /// Short description for display
    #[serde(default)]
    pub description: String,

    /// Sounds in application order
    pub sounds: Vec<PresetSound>,
}

impl Preset {
    /// Create a preset
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            sounds: Vec::new(),
        }
    }

    /// Append a sound
    #[must_use]
    pub fn with_sound(mut self, id: impl Into<SoundId>, volume: f32) -> Self {
        self.sounds.push(PresetSound::new(id, volume));
        self
    }

    /// Check whether the preset lists the given sound
    pub fn contains(&self, id: &str) -> bool {
        self.sounds.iter().any(|s| s.id.as_str() == id)
    }

    /// Validate a user-supplied preset
    ///
    /// Requires a non-blank name, 1 to 3 distinct sounds and finite volumes in [0, 1].
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::invalid_input("mix name must not be empty"));
        }
        if self.sounds.is_empty() {
            return Err(CoreError::invalid_input(format!(
                "mix '{}' lists no sounds",
                self.name
            )));
        }
        if self.sounds.len() > MAX_PRESET_SOUNDS {
            return Err(CoreError::invalid_input(format!(
                "mix '{}' lists {} sounds, at most {} can play together",
                self.name,
                self.sounds.len(),
                MAX_PRESET_SOUNDS
            )));
        }

        let mut seen = HashSet::new();
        for sound in &self.sounds {
            if !seen.insert(sound.id.as_str()) {
                return Err(CoreError::invalid_input(format!(
                    "mix '{}' lists '{}' twice",
                    self.name, sound.id
                )));
            }
            if !sound.volume.is_finite() || !(0.0..=1.0).contains(&sound.volume) {
                return Err(CoreError::invalid_input(format!(
                    "mix '{}' has volume {} for '{}', expected 0.0 - 1.0",
                    self.name, sound.volume, sound.id
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_preset_passes() {
        let preset = Preset::new("Storm", "Heavy weather")
            .with_sound("rain", 0.8)
            .with_sound("thunder", 0.4);
        assert!(preset.validate().is_ok());
        assert!(preset.contains("thunder"));
        assert!(!preset.contains("fire"));
    }

    #[test]
    fn rejects_blank_name_and_empty_sounds() {
        assert!(Preset::new("  ", "").with_sound("rain", 0.5).validate().is_err());
        assert!(Preset::new("Empty", "").validate().is_err());
    }

    #[test]
    fn rejects_more_than_three_sounds() {
        let preset = Preset::new("Crowded", "")
            .with_sound("rain", 0.5)
            .with_sound("wind", 0.5)
            .with_sound("fire", 0.5)
            .with_sound("birds", 0.5);
        assert!(preset.validate().is_err());
    }

    #[test]
    fn rejects_duplicates_and_bad_volumes() {
        let dup = Preset::new("Dup", "").with_sound("rain", 0.5).with_sound("rain", 0.2);
        assert!(dup.validate().is_err());

        let loud = Preset::new("Loud", "").with_sound("rain", 1.5);
        assert!(loud.validate().is_err());

        let nan = Preset::new("Nan", "").with_sound("rain", f32::NAN);
        assert!(nan.validate().is_err());
    }
}
