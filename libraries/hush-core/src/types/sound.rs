/// Sound catalog entries
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Sound identifier (e.g. `"rain"`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundId(String);

impl SoundId {
    /// Create a new sound ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SoundId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SoundId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for SoundId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Sound category, used for grouping in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCategory {
    Nature,
    Water,
    Weather,
    Urban,
    Noise,
    #[default]
    Other,
}

impl SoundCategory {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nature => "nature",
            Self::Water => "water",
            Self::Weather => "weather",
            Self::Urban => "urban",
            Self::Noise => "noise",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for SoundCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loopable ambient sound
///
/// Owned by the catalog and never mutated by playback; the engine clones it
/// into each active track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sound {
    /// Unique sound identifier
    pub id: SoundId,

    /// Display name
    pub name: String,

    /// Catalog category
    #[serde(default)]
    pub category: SoundCategory,

    /// Audio source locator (file path or URI), opaque to the engine
    pub source: String,

    /// Display icon (emoji or icon name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Sound {
    /// Create a sound with no icon
    pub fn new(
        id: impl Into<SoundId>,
        name: impl Into<String>,
        category: SoundCategory,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            source: source.into(),
            icon: None,
        }
    }

    /// Set the display icon
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sound_id_serializes_as_plain_string() {
        let id = SoundId::new("rain");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"rain\"");
        assert_eq!(id.to_string(), "rain");
    }

    #[test]
    fn sound_round_trips_without_icon() {
        let json = r#"{"id":"fire","name":"Campfire","category":"nature","source":"sounds/fire.mp3"}"#;
        let sound: Sound = serde_json::from_str(json).unwrap();
        assert_eq!(sound.id.as_str(), "fire");
        assert_eq!(sound.category, SoundCategory::Nature);
        assert!(sound.icon.is_none());
    }
}
