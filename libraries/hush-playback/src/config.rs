//! Playback configuration

use crate::fade::CrossfadeSettings;
use serde::{Deserialize, Serialize};

/// Maximum number of sounds mixed at once
pub const MAX_CONCURRENT_TRACKS: usize = 3;

/// Countdown tick period
pub const TIMER_TICK_MS: u64 = 1000;

/// Playback session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Master volume at startup (0.0 - 1.0); not persisted
    pub master_volume: f32,

    /// Loop crossfade timing and curve
    pub crossfade: CrossfadeSettings,

    /// How long a deferred play waits for a resource to finish loading
    pub ready_timeout_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            crossfade: CrossfadeSettings::default(),
            ready_timeout_ms: 5000,
        }
    }
}

impl PlaybackConfig {
    /// Master volume clamped to 0.0 - 1.0 (non-finite becomes 1.0)
    pub fn initial_master_volume(&self) -> f32 {
        if self.master_volume.is_finite() {
            self.master_volume.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}
