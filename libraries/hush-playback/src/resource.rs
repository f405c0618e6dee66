//! Platform-agnostic audio resource traits
//!
//! Abstracts the playable handle for one sound file (an HTML media element,
//! a desktop stream, a simulated resource in tests). The engine never decodes
//! audio itself; it only starts, pauses and re-gains resources and watches
//! their position to schedule the loop crossfade.

use crate::error::Result;
use hush_core::Sound;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one audio resource
///
/// Crossfades and recovery replace resources; the state reducer matches swap
/// notifications against these ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(u64);

impl ResourceId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "res#{}", self.0)
    }
}

/// One playable, loopable audio handle
pub trait AudioResource: Send {
    fn id(&self) -> ResourceId;

    /// Start or resume playback
    ///
    /// # Returns
    /// * `Err(NotReady)` - source still loading
    /// * `Err(PlaybackRejected)` - platform refused to start
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    /// Set output gain (0.0 - 1.0)
    fn set_gain(&mut self, gain: f32);

    fn gain(&self) -> f32;

    /// Playing and not yet at the end of the source
    fn is_playing(&self) -> bool;

    /// Source loaded far enough to start
    fn is_ready(&self) -> bool {
        true
    }

    /// Current playback position
    fn position(&self) -> Duration;

    /// Total length, `None` while unknown
    fn duration(&self) -> Option<Duration>;

    /// Take a pending media error, if one occurred since the last call
    fn take_error(&mut self) -> Option<String>;

    /// Reset the source and start loading it again
    fn reload(&mut self) -> Result<()>;

    /// Detach the source and free the handle
    ///
    /// Must be idempotent; a released resource never plays again.
    fn release(&mut self);

    /// Source reached its end
    fn has_ended(&self) -> bool {
        self.duration()
            .is_some_and(|duration| !duration.is_zero() && self.position() >= duration)
    }
}

/// Factory for audio resources
///
/// Implementations live in the applications (platform audio) or in
/// [`crate::sim`] for tests and headless runs.
pub trait AudioBackend: Send {
    /// Create a paused resource for `sound`
    fn create(&mut self, sound: &Sound) -> Result<Box<dyn AudioResource>>;

    /// Warm up the output device after the first user interaction
    fn prime(&mut self) {}
}
