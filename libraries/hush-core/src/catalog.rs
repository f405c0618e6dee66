//! Sound and preset catalog
//!
//! Read-only collections of available sounds and predefined mixes. The
//! built-in catalog ships with the application; a replacement can be loaded
//! from a JSON document of the form `{"sounds": [...], "presets": [...]}`.

use crate::error::{CoreError, Result};
use crate::types::{Preset, Sound, SoundCategory};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Ordered catalog of sounds and predefined presets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    sounds: Vec<Sound>,
    #[serde(default)]
    presets: Vec<Preset>,
}

impl Catalog {
    /// Create a catalog, rejecting duplicate sound ids or preset names
    pub fn new(sounds: Vec<Sound>, presets: Vec<Preset>) -> Result<Self> {
        let catalog = Self { sounds, presets };
        catalog.check_unique()?;
        Ok(catalog)
    }

    /// Parse a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.check_unique()?;
        Ok(catalog)
    }

    /// Load a catalog from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The catalog bundled with the application
    pub fn builtin() -> Self {
        use SoundCategory::{Noise, Nature, Urban, Water, Weather};

        let sounds = vec![
            Sound::new("rain", "Rain", Weather, "sounds/rain.mp3").with_icon("🌧️"),
            Sound::new("thunder", "Thunder", Weather, "sounds/thunder.mp3").with_icon("⛈️"),
            Sound::new("wind", "Wind", Weather, "sounds/wind.mp3").with_icon("🌬️"),
            Sound::new("fire", "Campfire", Nature, "sounds/fire.mp3").with_icon("🔥"),
            Sound::new("birds", "Birds", Nature, "sounds/birds.mp3").with_icon("🐦"),
            Sound::new("night", "Night Crickets", Nature, "sounds/night.mp3").with_icon("🦗"),
            Sound::new("forest", "Forest", Nature, "sounds/forest.mp3").with_icon("🌲"),
            Sound::new("waves", "Ocean Waves", Water, "sounds/waves.mp3").with_icon("🌊"),
            Sound::new("stream", "Stream", Water, "sounds/stream.mp3").with_icon("💧"),
            Sound::new("cafe", "Coffee Shop", Urban, "sounds/cafe.mp3").with_icon("☕"),
            Sound::new("train", "Train", Urban, "sounds/train.mp3").with_icon("🚆"),
            Sound::new("white-noise", "White Noise", Noise, "sounds/white-noise.mp3"),
            Sound::new("brown-noise", "Brown Noise", Noise, "sounds/brown-noise.mp3"),
        ];

        let presets = vec![
            Preset::new("Thunderstorm", "Heavy rain with rolling thunder")
                .with_sound("rain", 0.8)
                .with_sound("thunder", 0.6)
                .with_sound("wind", 0.4),
            Preset::new("Cozy Cabin", "A crackling fire while it rains outside")
                .with_sound("fire", 0.8)
                .with_sound("rain", 0.4)
                .with_sound("wind", 0.2),
            Preset::new("Ocean Breeze", "Waves rolling in on a windy shore")
                .with_sound("waves", 0.7)
                .with_sound("wind", 0.3)
                .with_sound("birds", 0.2),
            Preset::new("Forest Morning", "Birdsong by a running stream")
                .with_sound("birds", 0.6)
                .with_sound("stream", 0.4)
                .with_sound("forest", 0.3),
            Preset::new("Deep Focus", "Steady noise with a hint of rain")
                .with_sound("brown-noise", 0.6)
                .with_sound("rain", 0.3),
            Preset::new("Coffee Shop", "Background chatter on a rainy afternoon")
                .with_sound("cafe", 0.7)
                .with_sound("rain", 0.2),
        ];

        Self { sounds, presets }
    }

    /// All sounds in catalog order
    pub fn sounds(&self) -> &[Sound] {
        &self.sounds
    }

    /// Look up a sound by id
    pub fn sound(&self, id: &str) -> Option<&Sound> {
        self.sounds.iter().find(|s| s.id.as_str() == id)
    }

    /// Sounds in a category, in catalog order
    pub fn sounds_in(&self, category: SoundCategory) -> impl Iterator<Item = &Sound> {
        self.sounds.iter().filter(move |s| s.category == category)
    }

    /// All predefined presets in catalog order
    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    /// Look up a predefined preset by name (case-insensitive)
    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    fn check_unique(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for sound in &self.sounds {
            if !ids.insert(sound.id.as_str()) {
                return Err(CoreError::invalid_input(format!(
                    "duplicate sound id '{}' in catalog",
                    sound.id
                )));
            }
        }

        let mut names = HashSet::new();
        for preset in &self.presets {
            if !names.insert(preset.name.to_ascii_lowercase()) {
                return Err(CoreError::invalid_input(format!(
                    "duplicate preset '{}' in catalog",
                    preset.name
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
    fn builtin_presets_reference_known_sounds() {
        let catalog = Catalog::builtin();
        for preset in catalog.presets() {
            assert!(preset.validate().is_ok(), "{} is invalid", preset.name);
            for entry in &preset.sounds {
                assert!(
                    catalog.sound(entry.id.as_str()).is_some(),
                    "{} references unknown sound {}",
                    preset.name,
                    entry.id
                );
            }
        }
    }

    #[test]
    fn lookups() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.sound("rain").unwrap().name, "Rain");
        assert!(catalog.sound("bagpipes").is_none());
        assert!(catalog.preset("cozy cabin").is_some());
        assert!(catalog.sounds_in(SoundCategory::Water).count() >= 2);
    }

    #[test]
    fn from_json_rejects_duplicates() {
        let json = r#"{
            "sounds": [
                {"id": "rain", "name": "Rain", "source": "a.mp3"},
                {"id": "rain", "name": "Rain again", "source": "b.mp3"}
            ]
        }"#;
        assert!(Catalog::from_json(json).is_err());
    }

    #[test]
    fn from_json_defaults_presets() {
        let json = r#"{"sounds": [{"id": "rain", "name": "Rain", "source": "a.mp3"}]}"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.sounds().len(), 1);
        assert!(catalog.presets().is_empty());
    }
}
