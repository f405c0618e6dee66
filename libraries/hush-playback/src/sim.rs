//! Simulated audio backend
//!
//! Resources advance their position on the shared [`Clock`] while playing
//! and end after a configurable length. No audio is produced. Used by the
//! CLI in headless mode and by tests, which keep a clone of the backend to
//! inspect resources and inject failures.

use crate::clock::Clock;
use crate::error::{PlaybackError, Result};
use crate::resource::{AudioBackend, AudioResource, ResourceId};
use hush_core::{Sound, SoundId};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// Default simulated track length
pub const DEFAULT_TRACK_LENGTH_MS: u64 = 60_000;

/// Released resources kept for inspection before being forgotten
pub const RELEASED_HISTORY: usize = 32;

#[derive(Debug)]
struct SimTrack {
    sound_id: SoundId,
    gain: f32,
    playing: bool,
    released: bool,
    /// Position when last paused or started
    base_ms: u64,
    started_at_ms: u64,
    length_ms: u64,
    ready_at_ms: u64,
    error: Option<String>,
    play_calls: u32,
    reloads: u32,
}

impl SimTrack {
    fn position_ms(&self, now_ms: u64) -> u64 {
        let position = if self.playing {
            self.base_ms + now_ms.saturating_sub(self.started_at_ms)
        } else {
            self.base_ms
        };
        position.min(self.length_ms)
    }
}

#[derive(Debug, Default)]
struct SimShared {
    tracks: HashMap<ResourceId, SimTrack>,
    created: Vec<ResourceId>,
    /// Released resources, oldest first
    released: VecDeque<ResourceId>,
    default_length_ms: u64,
    lengths: HashMap<SoundId, u64>,
    load_latency_ms: u64,
    fail_create: HashMap<SoundId, u32>,
    reject_plays: HashMap<SoundId, u32>,
    primed: bool,
}

/// Point-in-time view of one simulated resource
#[derive(Debug, Clone, PartialEq)]
pub struct SimSnapshot {
    pub sound_id: SoundId,
    pub gain: f32,
    pub playing: bool,
    pub released: bool,
    pub position_ms: u64,
    pub play_calls: u32,
    pub reloads: u32,
}

/// Clock-driven fake backend; clones share all resources
#[derive(Clone)]
pub struct SimulatedBackend {
    clock: Arc<dyn Clock>,
    shared: Arc<Mutex<SimShared>>,
}

impl SimulatedBackend {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            shared: Arc::new(Mutex::new(SimShared {
                default_length_ms: DEFAULT_TRACK_LENGTH_MS,
                ..SimShared::default()
            })),
        }
    }

    /// Length for sounds without an explicit one
    pub fn set_default_length(&self, length: Duration) {
        self.shared.lock().default_length_ms = millis(length);
    }

    pub fn set_length(&self, sound: &str, length: Duration) {
        self.shared
            .lock()
            .lengths
            .insert(SoundId::new(sound), millis(length));
    }

    /// Time from creation or reload until a resource is ready
    pub fn set_load_latency(&self, latency: Duration) {
        self.shared.lock().load_latency_ms = millis(latency);
    }

    /// Make the next `create` for `sound` fail
    pub fn fail_next_create(&self, sound: &str) {
        *self
            .shared
            .lock()
            .fail_create
            .entry(SoundId::new(sound))
            .or_default() += 1;
    }

    /// Reject the next `count` play calls on resources of `sound`
    pub fn reject_next_plays(&self, sound: &str, count: u32) {
        *self
            .shared
            .lock()
            .reject_plays
            .entry(SoundId::new(sound))
            .or_default() += count;
    }

    /// Report a media error on `resource`
    pub fn inject_error(&self, resource: ResourceId, message: &str) {
        if let Some(track) = self.shared.lock().tracks.get_mut(&resource) {
            track.error = Some(message.to_string());
        }
    }

    /// Resources created for `sound`, oldest first
    ///
    /// Only the last [`RELEASED_HISTORY`] released resources are remembered.
    pub fn resources_for(&self, sound: &str) -> Vec<ResourceId> {
        let shared = self.shared.lock();
        shared
            .created
            .iter()
            .filter(|id| {
                shared
                    .tracks
                    .get(*id)
                    .is_some_and(|t| t.sound_id.as_str() == sound)
            })
            .copied()
            .collect()
    }

    /// Resources not yet released
    pub fn live_resources(&self) -> Vec<ResourceId> {
        let shared = self.shared.lock();
        shared
            .created
            .iter()
            .filter(|id| shared.tracks.get(*id).is_some_and(|t| !t.released))
            .copied()
            .collect()
    }

    pub fn snapshot(&self, resource: ResourceId) -> Option<SimSnapshot> {
        let now = self.clock.now_ms();
        let shared = self.shared.lock();
        shared.tracks.get(&resource).map(|t| SimSnapshot {
            sound_id: t.sound_id.clone(),
            gain: t.gain,
            playing: t.playing && t.position_ms(now) < t.length_ms,
            released: t.released,
            position_ms: t.position_ms(now),
            play_calls: t.play_calls,
            reloads: t.reloads,
        })
    }

    pub fn is_primed(&self) -> bool {
        self.shared.lock().primed
    }
}

impl AudioBackend for SimulatedBackend {
    fn create(&mut self, sound: &Sound) -> Result<Box<dyn AudioResource>> {
        let now = self.clock.now_ms();
        let mut shared = self.shared.lock();

        if let Some(pending) = shared.fail_create.get_mut(&sound.id) {
            if *pending > 0 {
                *pending -= 1;
                return Err(PlaybackError::ResourceUnavailable(format!(
                    "simulated failure for {}",
                    sound.source
                )));
            }
        }

        let id = ResourceId::next();
        let length_ms = shared
            .lengths
            .get(&sound.id)
            .copied()
            .unwrap_or(shared.default_length_ms);
        let ready_at_ms = now + shared.load_latency_ms;
        shared.tracks.insert(
            id,
            SimTrack {
                sound_id: sound.id.clone(),
                gain: 1.0,
                playing: false,
                released: false,
                base_ms: 0,
                started_at_ms: now,
                length_ms,
                ready_at_ms,
                error: None,
                play_calls: 0,
                reloads: 0,
            },
        );
        shared.created.push(id);

        Ok(Box::new(SimulatedResource {
            id,
            clock: Arc::clone(&self.clock),
            shared: Arc::clone(&self.shared),
        }))
    }

    fn prime(&mut self) {
        self.shared.lock().primed = true;
    }
}

struct SimulatedResource {
    id: ResourceId,
    clock: Arc<dyn Clock>,
    shared: Arc<Mutex<SimShared>>,
}

impl SimulatedResource {
    fn with_track<T>(&self, f: impl FnOnce(&mut SimTrack, u64) -> T) -> Option<T> {
        let now = self.clock.now_ms();
        self.shared
            .lock()
            .tracks
            .get_mut(&self.id)
            .map(|track| f(track, now))
    }
}

impl AudioResource for SimulatedResource {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn play(&mut self) -> Result<()> {
        let now = self.clock.now_ms();
        let mut shared = self.shared.lock();
        let shared = &mut *shared;
        let track = shared
            .tracks
            .get_mut(&self.id)
            .ok_or(PlaybackError::Released)?;

        if track.released {
            return Err(PlaybackError::Released);
        }
        track.play_calls += 1;
        if now < track.ready_at_ms {
            return Err(PlaybackError::NotReady);
        }
        if let Some(pending) = shared.reject_plays.get_mut(&track.sound_id) {
            if *pending > 0 {
                *pending -= 1;
                return Err(PlaybackError::PlaybackRejected(
                    "simulated rejection".to_string(),
                ));
            }
        }

        if track.playing {
            return Ok(());
        }
        // Like a media element, playing an ended source restarts it
        if track.base_ms >= track.length_ms {
            track.base_ms = 0;
        }
        track.playing = true;
        track.started_at_ms = now;
        Ok(())
    }

    fn pause(&mut self) {
        self.with_track(|track, now| {
            track.base_ms = track.position_ms(now);
            track.playing = false;
        });
    }

    fn set_gain(&mut self, gain: f32) {
        self.with_track(|track, _| track.gain = gain);
    }

    fn gain(&self) -> f32 {
        self.with_track(|track, _| track.gain).unwrap_or(0.0)
    }

    fn is_playing(&self) -> bool {
        self.with_track(|track, now| {
            !track.released && track.playing && track.position_ms(now) < track.length_ms
        })
        .unwrap_or(false)
    }

    fn is_ready(&self) -> bool {
        self.with_track(|track, now| now >= track.ready_at_ms)
            .unwrap_or(false)
    }

    fn position(&self) -> Duration {
        self.with_track(|track, now| Duration::from_millis(track.position_ms(now)))
            .unwrap_or_default()
    }

    fn duration(&self) -> Option<Duration> {
        self.with_track(|track, now| {
            (now >= track.ready_at_ms).then(|| Duration::from_millis(track.length_ms))
        })
        .flatten()
    }

    fn take_error(&mut self) -> Option<String> {
        self.with_track(|track, _| track.error.take()).flatten()
    }

    fn reload(&mut self) -> Result<()> {
        let latency = self.shared.lock().load_latency_ms;
        self.with_track(|track, now| {
            if track.released {
                return Err(PlaybackError::Released);
            }
            track.reloads += 1;
            track.playing = false;
            track.base_ms = 0;
            track.error = None;
            track.ready_at_ms = now + latency;
            Ok(())
        })
        .unwrap_or(Err(PlaybackError::Released))
    }

    fn release(&mut self) {
        let now = self.clock.now_ms();
        let mut shared = self.shared.lock();
        let Some(track) = shared.tracks.get_mut(&self.id) else {
            return;
        };
        if track.released {
            return;
        }
        track.base_ms = track.position_ms(now);
        track.playing = false;
        track.released = true;

        shared.released.push_back(self.id);
        while shared.released.len() > RELEASED_HISTORY {
            if let Some(old) = shared.released.pop_front() {
                shared.tracks.remove(&old);
                shared.created.retain(|id| *id != old);
            }
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
