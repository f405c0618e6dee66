//! Playback session
//!
//! [`PlaybackSession`] is the single owner of playback state. Every public
//! operation becomes an [`Action`], goes through the reducer, has its audio
//! effects executed by the [`Mixer`], reconciles any resource swaps the
//! players reported while doing so, persists the saved projection when it
//! changed, and finally notifies subscribers with the new snapshot.
//!
//! The session is synchronous and poll-driven. The host calls
//! [`PlaybackSession::poll`] regularly (every 50 ms is plenty) to advance
//! loop crossfades, deferred plays and the sleep timer.

use crate::clock::{Clock, SystemClock};
use crate::config::{PlaybackConfig, MAX_CONCURRENT_TRACKS};
use crate::countdown::{Countdown, CountdownEvent};
use crate::error::SessionError;
use crate::events::{Notice, SwapEvent};
use crate::mixer::Mixer;
use crate::reducer::{self, Action, SwapOutcome, ToggleOutcome};
use crate::resource::AudioBackend;
use crate::state::PlaybackState;
use crate::unlock::{Interaction, UnlockGate};
use crossbeam_channel::Receiver;
use hush_core::{
    Catalog, KeyValueStore, MemoryStore, Preset, SavedTrackSettings, SettingsRepository, Sound,
    TimerOption,
};
use std::sync::Arc;

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Handle returned by [`PlaybackSession::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&PlaybackState) + Send>;

/// Builder for [`PlaybackSession`]
pub struct SessionBuilder {
    config: PlaybackConfig,
    catalog: Catalog,
    repository: Option<SettingsRepository>,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Defaults: built-in catalog, in-memory storage, system clock
    pub fn new() -> Self {
        Self {
            config: PlaybackConfig::default(),
            catalog: Catalog::builtin(),
            repository: None,
            clock: None,
        }
    }

    #[must_use]
    pub fn config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Persist settings in `store`
    #[must_use]
    pub fn store(mut self, store: impl KeyValueStore + 'static) -> Self {
        self.repository = Some(SettingsRepository::new(store));
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Restore saved settings and start the session
    pub fn start(self, backend: impl AudioBackend + 'static) -> PlaybackSession {
        PlaybackSession::start(
            self.config,
            self.catalog,
            self.repository
                .unwrap_or_else(|| SettingsRepository::new(MemoryStore::new())),
            self.clock.unwrap_or_else(|| Arc::new(SystemClock::new())),
            Box::new(backend),
        )
    }
}

/// Owner of playback state, audio players and persistence
pub struct PlaybackSession {
    state: PlaybackState,
    catalog: Catalog,
    custom_mixes: Vec<Preset>,
    mixer: Mixer,
    swaps: Receiver<SwapEvent>,
    countdown: Countdown,
    repository: SettingsRepository,
    /// Last successfully written saved projection
    persisted: Option<SavedTrackSettings>,
    clock: Arc<dyn Clock>,
    subscribers: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    notices: Vec<Notice>,
    unlock: UnlockGate,
}

impl PlaybackSession {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Build the session and restore the previous mix
    ///
    /// Saved settings that cannot be read are logged and replaced with an
    /// empty set. Every catalog sound with a positive saved volume is
    /// reactivated, up to capacity, without starting playback.
    pub fn start(
        config: PlaybackConfig,
        catalog: Catalog,
        repository: SettingsRepository,
        clock: Arc<dyn Clock>,
        backend: Box<dyn AudioBackend>,
    ) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mixer = Mixer::new(
            backend,
            config.crossfade.clone(),
            config.ready_timeout_ms,
            tx,
        );

        let mut session = Self {
            state: PlaybackState::new(config.initial_master_volume()),
            catalog,
            custom_mixes: Vec::new(),
            mixer,
            swaps: rx,
            countdown: Countdown::new(),
            repository,
            persisted: None,
            clock,
            subscribers: Vec::new(),
            next_subscription: 0,
            notices: Vec::new(),
            unlock: UnlockGate::new(),
        };
        session.restore();
        session
    }

    fn restore(&mut self) {
        let saved = match self.repository.load_track_settings() {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!(error = %e, "could not read saved track settings, starting fresh");
                SavedTrackSettings::new()
            }
        };

        self.custom_mixes = match self.repository.load_custom_mixes() {
            Ok(mixes) => mixes
                .into_iter()
                .filter(|mix| match mix.validate() {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(mix = %mix.name, error = %e, "dropping invalid custom mix");
                        false
                    }
                })
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read custom mixes, starting with none");
                Vec::new()
            }
        };

        self.persisted = Some(saved.clone());
        let candidates: Vec<Sound> = saved
            .iter()
            .filter(|(_, track)| track.volume > 0.0)
            .filter_map(|(id, _)| match self.catalog.sound(id.as_str()) {
                Some(sound) => Some(sound.clone()),
                None => {
                    tracing::debug!(sound = %id, "saved sound not in catalog, skipped");
                    None
                }
            })
            .collect();
        self.dispatch(Action::RestoreState(saved));

        for sound in candidates {
            if self.state.tracks.len() >= MAX_CONCURRENT_TRACKS {
                tracing::debug!(sound = %sound.id, "capacity reached while restoring");
                break;
            }
            self.dispatch(Action::ToggleTrack(sound));
        }

        tracing::info!(
            tracks = self.state.tracks.len(),
            custom_mixes = self.custom_mixes.len(),
            "playback session started"
        );
    }

    /// Current state snapshot
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn custom_mixes(&self) -> &[Preset] {
        &self.custom_mixes
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    /// Add the sound to the mix, or remove it if already active
    pub fn toggle_track(&mut self, id: &str) -> Result<ToggleOutcome> {
        let sound = self.sound(id)?;
        let outcome = reducer::toggle_outcome(&self.state, id);

        match outcome {
            ToggleOutcome::AtCapacity => {
                tracing::info!(sound = %sound.id, max = MAX_CONCURRENT_TRACKS, "mix is full");
                self.notices.push(Notice::CapacityReached {
                    id: sound.id,
                    max: MAX_CONCURRENT_TRACKS,
                });
                return Ok(outcome);
            }
            ToggleOutcome::Added => {
                tracing::info!(sound = %sound.id, "track added");
                self.notices.push(Notice::TrackAdded {
                    id: sound.id.clone(),
                    name: sound.name.clone(),
                });
            }
            ToggleOutcome::Removed => {
                tracing::info!(sound = %sound.id, "track removed");
                self.notices.push(Notice::TrackRemoved {
                    id: sound.id.clone(),
                    name: sound.name.clone(),
                });
            }
        }

        self.dispatch(Action::ToggleTrack(sound));
        Ok(outcome)
    }

    /// Set one track's volume (0.0 - 1.0, clamped); inactive sounds are ignored
    pub fn set_volume_for_sound(&mut self, id: &str, volume: f32) -> Result<()> {
        let volume = finite(volume)?;
        let sound = self.sound(id)?;
        self.dispatch(Action::SetTrackVolume {
            id: sound.id,
            volume,
        });
        Ok(())
    }

    /// Set the master volume (0.0 - 1.0, clamped)
    pub fn set_master_volume(&mut self, volume: f32) -> Result<()> {
        let volume = finite(volume)?;
        self.dispatch(Action::SetMasterVolume(volume));
        Ok(())
    }

    /// Flip the global play intent; returns the new value
    pub fn toggle_play_pause(&mut self) -> bool {
        self.dispatch(Action::TogglePlayPause);
        tracing::info!(playing = self.state.is_playing, "play/pause toggled");
        self.state.is_playing
    }

    pub fn pause_all_sounds(&mut self) {
        self.dispatch(Action::PauseAll);
    }

    pub fn play_all_sounds(&mut self) {
        self.dispatch(Action::PlayAll);
    }

    /// Select a sleep timer; unbounded cancels any countdown
    pub fn set_timer(&mut self, option: TimerOption) {
        let now_ms = self.clock.now_ms();
        self.dispatch(Action::SetTimer { option, now_ms });

        if let Some(deadline) = self.state.timer_deadline_ms {
            self.countdown.arm(deadline, now_ms);
            tracing::info!(timer = %option, deadline_ms = deadline, "sleep timer set");
        } else if self.countdown.disarm() {
            tracing::info!("sleep timer cleared");
        }
        self.notices.push(Notice::TimerSet { option });
    }

    pub fn cancel_timer(&mut self) {
        self.countdown.disarm();
        self.dispatch(Action::CancelTimer);
        tracing::info!("sleep timer cancelled");
        self.notices.push(Notice::TimerCancelled);
    }

    /// Replace the mix with `mix`
    ///
    /// Sounds missing from the catalog are skipped; at most
    /// [`MAX_CONCURRENT_TRACKS`] distinct sounds are used.
    pub fn apply_mix(&mut self, mix: &Preset) {
        let sounds: Vec<(Sound, f32)> = mix
            .sounds
            .iter()
            .filter_map(|entry| match self.catalog.sound(entry.id.as_str()) {
                Some(sound) => Some((sound.clone(), entry.volume)),
                None => {
                    tracing::warn!(mix = %mix.name, sound = %entry.id, "mix references unknown sound");
                    None
                }
            })
            .collect();
        if sounds.len() > MAX_CONCURRENT_TRACKS {
            tracing::warn!(mix = %mix.name, sounds = sounds.len(), "mix lists too many sounds, extra ignored");
        }

        self.dispatch(Action::ApplyPreset {
            name: mix.name.clone(),
            sounds,
        });
        tracing::info!(mix = %mix.name, "mix applied");
        self.notices.push(Notice::MixApplied {
            name: mix.name.clone(),
        });
    }

    /// Apply a custom or built-in mix by name; custom mixes take precedence
    pub fn apply_mix_named(&mut self, name: &str) -> Result<()> {
        let mix = self
            .custom_mixes
            .iter()
            .find(|mix| mix.name == name)
            .or_else(|| self.catalog.preset(name))
            .cloned()
            .ok_or_else(|| SessionError::UnknownMix(name.to_string()))?;
        self.apply_mix(&mix);
        Ok(())
    }

    /// Save (or replace, by name) a custom mix
    pub fn save_custom_mix(&mut self, mix: Preset) -> Result<()> {
        mix.validate()
            .map_err(|e| SessionError::InvalidMix(e.to_string()))?;
        if let Some(unknown) = mix
            .sounds
            .iter()
            .find(|entry| self.catalog.sound(entry.id.as_str()).is_none())
        {
            return Err(SessionError::UnknownSound(unknown.id.to_string()));
        }

        let name = mix.name.clone();
        match self.custom_mixes.iter_mut().find(|m| m.name == name) {
            Some(existing) => *existing = mix,
            None => self.custom_mixes.push(mix),
        }
        self.persist_custom_mixes();
        tracing::info!(mix = %name, "custom mix saved");
        self.notices.push(Notice::MixSaved { name });
        Ok(())
    }

    /// Delete a custom mix; returns whether it existed
    pub fn delete_custom_mix(&mut self, name: &str) -> bool {
        let before = self.custom_mixes.len();
        self.custom_mixes.retain(|m| m.name != name);
        if self.custom_mixes.len() == before {
            return false;
        }
        self.persist_custom_mixes();
        tracing::info!(mix = name, "custom mix deleted");
        self.notices.push(Notice::MixDeleted {
            name: name.to_string(),
        });
        true
    }

    /// Register a listener called with every new state
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&PlaybackState) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Take queued user notifications
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Register a hook for the first user interaction
    pub fn on_unlock(&mut self, hook: impl FnOnce(Interaction) + Send + 'static) -> bool {
        self.unlock.on_unlock(hook)
    }

    /// Report a user interaction; the first one primes the audio backend
    pub fn notify_user_interaction(&mut self, interaction: Interaction) -> bool {
        if !self.unlock.trigger(interaction) {
            return false;
        }
        self.mixer.prime();
        tracing::debug!(?interaction, "audio unlocked");
        true
    }

    /// Reconcile a resource swap reported by a track player
    pub fn handle_crossfade(&mut self, event: SwapEvent) -> SwapOutcome {
        let outcome = self.reconcile(event);
        self.drain_swaps();
        self.persist();
        self.broadcast();
        outcome
    }

    /// Advance players, reconcile their swaps and run the sleep timer
    pub fn poll(&mut self) {
        let now_ms = self.clock.now_ms();
        self.mixer.poll(now_ms);

        if self.drain_swaps() > 0 {
            self.persist();
            self.broadcast();
        }

        match self.countdown.poll(now_ms) {
            Some(CountdownEvent::Tick { remaining_ms }) => {
                self.dispatch(Action::TickTimer(remaining_ms));
            }
            Some(CountdownEvent::Elapsed) => {
                tracing::info!("sleep timer elapsed, pausing all sounds");
                self.dispatch(Action::TickTimer(0));
                self.dispatch(Action::PauseAll);
                self.dispatch(Action::CancelTimer);
                self.notices.push(Notice::TimerElapsed);
            }
            None => {}
        }
    }

    /// Release every resource, stop the countdown and drop subscribers
    pub fn teardown(mut self) {
        self.countdown.disarm();
        self.mixer.release_all();
        self.subscribers.clear();
        tracing::info!("playback session torn down");
    }

    fn sound(&self, id: &str) -> Result<Sound> {
        self.catalog
            .sound(id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownSound(id.to_string()))
    }

    /// Reduce, execute, reconcile, persist, broadcast
    fn dispatch(&mut self, action: Action) {
        self.apply(action);
        self.drain_swaps();
        self.persist();
        self.broadcast();
    }

    fn apply(&mut self, action: Action) -> reducer::Outcome {
        let transition = reducer::reduce(&self.state, action);
        self.state = transition.state;

        let now_ms = self.clock.now_ms();
        for (id, resource) in self.mixer.apply(transition.effects, now_ms) {
            self.state = reducer::reduce(&self.state, Action::ResourceAttached { id, resource }).state;
        }
        transition.outcome
    }

    fn reconcile(&mut self, event: SwapEvent) -> SwapOutcome {
        let outcome = reducer::swap_outcome(&self.state, &event);
        match outcome {
            SwapOutcome::Reconciled => {
                tracing::debug!(sound = %event.sound_id, cause = ?event.cause, "swap reconciled");
            }
            SwapOutcome::Recovered => {
                tracing::info!(
                    sound = %event.sound_id,
                    outgoing = %event.outgoing,
                    "swap matched by sound id"
                );
            }
            SwapOutcome::Dropped => {
                tracing::warn!(
                    sound = %event.sound_id,
                    outgoing = %event.outgoing,
                    "swap for inactive sound dropped"
                );
            }
        }
        self.apply(Action::ResourceSwapped(event));
        outcome
    }

    /// Reconcile every swap the players reported; returns how many
    fn drain_swaps(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.swaps.try_recv() {
            self.reconcile(event);
            count += 1;
        }
        count
    }

    fn persist(&mut self) {
        if self.persisted.as_ref() == Some(&self.state.saved_track_settings) {
            return;
        }
        match self
            .repository
            .save_track_settings(&self.state.saved_track_settings)
        {
            Ok(()) => self.persisted = Some(self.state.saved_track_settings.clone()),
            Err(e) => tracing::warn!(error = %e, "could not persist track settings"),
        }
    }

    fn persist_custom_mixes(&mut self) {
        if let Err(e) = self.repository.save_custom_mixes(&self.custom_mixes) {
            tracing::warn!(error = %e, "could not persist custom mixes");
        }
    }

    fn broadcast(&mut self) {
        for (_, listener) in &mut self.subscribers {
            listener(&self.state);
        }
    }
}

fn finite(volume: f32) -> Result<f32> {
    if volume.is_finite() {
        Ok(volume)
    } else {
        Err(SessionError::InvalidVolume(volume))
    }
}
