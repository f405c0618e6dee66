//! Playback state snapshot
//!
//! [`PlaybackState`] is the single source of truth the session hands to
//! subscribers. It is plain data: every change goes through
//! [`crate::reducer::reduce`].

use crate::config::MAX_CONCURRENT_TRACKS;
use crate::resource::ResourceId;
use hush_core::{SavedTrackSettings, Sound, SoundId, TimerOption};
use serde::Serialize;

/// A sound currently in the mix
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTrack {
    pub sound: Sound,

    /// Resource currently playing for this sound; `None` until the mixer
    /// attached one
    pub resource: Option<ResourceId>,

    /// Per-track volume (0.0 - 1.0)
    pub volume: f32,
}

impl ActiveTrack {
    pub fn id(&self) -> &SoundId {
        &self.sound.id
    }

    /// Gain actually applied to the resource
    pub fn effective_gain(&self, master_volume: f32) -> f32 {
        self.volume * master_volume
    }
}

/// Complete playback state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Active tracks in insertion order, at most [`MAX_CONCURRENT_TRACKS`]
    pub tracks: Vec<ActiveTrack>,

    /// Master volume (0.0 - 1.0), multiplies every track's volume
    pub master_volume: f32,

    /// Whether the mix is meant to be audible
    pub is_playing: bool,

    /// Selected countdown option
    pub timer: TimerOption,

    /// Milliseconds left on the countdown, `None` when unbounded
    pub time_remaining_ms: Option<u64>,

    /// Absolute countdown deadline (clock milliseconds)
    pub timer_deadline_ms: Option<u64>,

    /// Persisted per-sound settings
    pub saved_track_settings: SavedTrackSettings,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PlaybackState {
    pub fn new(master_volume: f32) -> Self {
        Self {
            tracks: Vec::new(),
            master_volume,
            is_playing: false,
            timer: TimerOption::Unbounded,
            time_remaining_ms: None,
            timer_deadline_ms: None,
            saved_track_settings: SavedTrackSettings::new(),
        }
    }

    pub fn track(&self, id: &str) -> Option<&ActiveTrack> {
        self.tracks.iter().find(|t| t.sound.id.as_str() == id)
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.track(id).is_some()
    }

    /// No room for another track
    pub fn is_full(&self) -> bool {
        self.tracks.len() >= MAX_CONCURRENT_TRACKS
    }

    /// `volume × master_volume` for an active track
    pub fn effective_gain(&self, id: &str) -> Option<f32> {
        self.track(id)
            .map(|t| t.effective_gain(self.master_volume))
    }
}
