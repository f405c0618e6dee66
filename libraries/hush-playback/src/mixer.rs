//! Effect executor
//!
//! The mixer owns the audio backend and one [`TrackPlayer`] per active sound.
//! It turns reducer [`Effect`]s into player calls and reports the resources
//! it created so the session can attach them to state.

use crate::events::SwapEvent;
use crate::fade::CrossfadeSettings;
use crate::reducer::Effect;
use crate::resource::{AudioBackend, ResourceId};
use crate::track::TrackPlayer;
use crossbeam_channel::Sender;
use hush_core::SoundId;
use std::collections::HashMap;

pub struct Mixer {
    backend: Box<dyn AudioBackend>,
    players: HashMap<SoundId, TrackPlayer>,
    settings: CrossfadeSettings,
    ready_timeout_ms: u64,
    events: Sender<SwapEvent>,
}

impl Mixer {
    pub fn new(
        backend: Box<dyn AudioBackend>,
        settings: CrossfadeSettings,
        ready_timeout_ms: u64,
        events: Sender<SwapEvent>,
    ) -> Self {
        Self {
            backend,
            players: HashMap::new(),
            settings,
            ready_timeout_ms,
            events,
        }
    }

    /// Execute effects in order
    ///
    /// # Returns
    /// Resources created by `Spawn` effects, keyed by sound
    pub fn apply(&mut self, effects: Vec<Effect>, now_ms: u64) -> Vec<(SoundId, ResourceId)> {
        let mut attached = Vec::new();

        for effect in effects {
            match effect {
                Effect::Spawn { sound, gain, play } => {
                    if let Some(mut old) = self.players.remove(&sound.id) {
                        tracing::warn!(sound = %sound.id, "replacing existing player");
                        old.stop();
                    }
                    let resource = match self.backend.create(&sound) {
                        Ok(resource) => resource,
                        Err(e) => {
                            tracing::error!(sound = %sound.id, error = %e, "could not create audio resource");
                            continue;
                        }
                    };

                    let id = sound.id.clone();
                    let mut player = TrackPlayer::new(
                        sound,
                        resource,
                        gain,
                        self.settings.clone(),
                        self.ready_timeout_ms,
                        self.events.clone(),
                    );
                    if play {
                        player.play(now_ms);
                    }
                    tracing::debug!(sound = %id, resource = %player.resource_id(), gain, play, "player spawned");
                    attached.push((id.clone(), player.resource_id()));
                    self.players.insert(id, player);
                }
                Effect::Release { id } => {
                    if let Some(mut player) = self.players.remove(&id) {
                        player.stop();
                        tracing::debug!(sound = %id, "player released");
                    }
                }
                Effect::SetGain { id, gain } => {
                    if let Some(player) = self.players.get_mut(&id) {
                        player.set_gain(gain);
                    }
                }
                Effect::Play { id } => {
                    if let Some(player) = self.players.get_mut(&id) {
                        player.play(now_ms);
                    }
                }
                Effect::Pause { id } => {
                    if let Some(player) = self.players.get_mut(&id) {
                        player.pause();
                    }
                }
            }
        }

        attached
    }

    /// Drive every player
    pub fn poll(&mut self, now_ms: u64) {
        for player in self.players.values_mut() {
            player.poll(now_ms, self.backend.as_mut());
        }
    }

    pub fn player(&self, id: &str) -> Option<&TrackPlayer> {
        self.players.get(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Warm up the output device
    pub fn prime(&mut self) {
        self.backend.prime();
    }

    /// Stop and drop every player
    pub fn release_all(&mut self) {
        for (id, mut player) in self.players.drain() {
            player.stop();
            tracing::debug!(sound = %id, "player released");
        }
    }
}
