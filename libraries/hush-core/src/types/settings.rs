/// Persisted per-track playback settings
use crate::types::SoundId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Last-known settings for one sound
///
/// `volume` uses the 0-100 scale of the persisted format, not the
/// normalized gain used during playback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTrack {
    pub volume: f32,
    pub was_playing: bool,
}

impl SavedTrack {
    /// Build from a normalized (0.0 - 1.0) volume
    pub fn from_gain(volume: f32, was_playing: bool) -> Self {
        Self {
            volume: volume * 100.0,
            was_playing,
        }
    }

    /// Normalized (0.0 - 1.0) volume
    pub fn gain(&self) -> f32 {
        (self.volume / 100.0).clamp(0.0, 1.0)
    }
}

/// Sound id → saved settings, ordered by id for stable serialization
pub type SavedTrackSettings = BTreeMap<SoundId, SavedTrack>;
