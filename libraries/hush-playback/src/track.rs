//! Gapless looping track player
//!
//! A [`TrackPlayer`] keeps one sound looping without a seam. Near the end of
//! the current resource it preloads a fresh resource for the same sound and
//! crossfades into it, then releases the old one. Every adopted resource is
//! watched the same way, so looping needs no special end-of-track handling.
//!
//! The player is poll-driven: the owner calls [`TrackPlayer::poll`] with the
//! current clock time, typically every few tens of milliseconds. Resource
//! replacements are reported as [`SwapEvent`]s on a channel so the session
//! can reconcile its state.

use crate::error::PlaybackError;
use crate::events::{SwapCause, SwapEvent};
use crate::fade::CrossfadeSettings;
use crate::resource::{AudioBackend, AudioResource, ResourceId};
use crate::schedule::Ticker;
use crossbeam_channel::Sender;
use hush_core::{Sound, SoundId};
use std::time::Duration;

/// Lifecycle tag of the player's current resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckState {
    /// Playing or paused, not fading
    Idle,
    /// Outgoing side of a loop crossfade
    Fading,
    /// Released; never plays again
    Released,
}

/// A start waiting for the resource to finish loading
#[derive(Debug, Clone, Copy)]
struct PendingStart {
    deadline_ms: u64,
    reloaded: bool,
}

struct Deck {
    handle: Box<dyn AudioResource>,
    state: DeckState,
    recovery_attempted: bool,
    pending: Option<PendingStart>,
}

impl Deck {
    fn new(handle: Box<dyn AudioResource>) -> Self {
        Self {
            handle,
            state: DeckState::Idle,
            recovery_attempted: false,
            pending: None,
        }
    }

    fn id(&self) -> ResourceId {
        self.handle.id()
    }

    fn is_starting(&self) -> bool {
        self.pending.is_some()
    }

    /// Start playback, waiting up to `timeout_ms` for the resource to load
    fn start(&mut self, sound: &SoundId, now_ms: u64, timeout_ms: u64) {
        if !self.handle.is_ready() {
            tracing::debug!(%sound, resource = %self.id(), "resource not ready, deferring play");
        }
        self.attempt(
            sound,
            now_ms,
            PendingStart {
                deadline_ms: now_ms.saturating_add(timeout_ms),
                reloaded: false,
            },
        );
    }

    /// Retry a deferred start once the resource is ready or the wait ran out
    fn poll_pending(&mut self, sound: &SoundId, now_ms: u64) {
        if let Some(pending) = self.pending {
            if self.handle.is_ready() || now_ms >= pending.deadline_ms {
                self.attempt(sound, now_ms, pending);
            }
        }
    }

    /// A rejected play reloads the source and retries once
    fn attempt(&mut self, sound: &SoundId, now_ms: u64, mut pending: PendingStart) {
        self.pending = None;
        if !self.handle.is_ready() {
            self.defer(sound, now_ms, pending);
            return;
        }
        match self.handle.play() {
            Ok(()) => {}
            Err(PlaybackError::NotReady) => self.defer(sound, now_ms, pending),
            Err(e) if pending.reloaded => {
                tracing::error!(%sound, error = %e, "play failed after reload, track stays paused");
            }
            Err(first) => {
                tracing::warn!(%sound, error = %first, "play rejected, reloading");
                if let Err(e) = self.handle.reload() {
                    tracing::error!(%sound, error = %e, "reload failed, track stays paused");
                    return;
                }
                pending.reloaded = true;
                self.attempt(sound, now_ms, pending);
            }
        }
    }

    fn defer(&mut self, sound: &SoundId, now_ms: u64, pending: PendingStart) {
        if now_ms >= pending.deadline_ms {
            tracing::warn!(%sound, resource = %self.id(), "resource never became ready, play dropped");
        } else {
            self.pending = Some(pending);
        }
    }

    fn pause(&mut self) {
        self.pending = None;
        self.handle.pause();
    }

    fn release(&mut self) {
        self.pending = None;
        if self.state != DeckState::Released {
            self.handle.pause();
            self.handle.release();
            self.state = DeckState::Released;
        }
    }
}

struct Crossfade {
    incoming: Deck,
    ticker: Ticker,
    initial_gain: f32,
    target_gain: f32,
}

/// Player for one looping sound
pub struct TrackPlayer {
    sound: Sound,
    current: Deck,
    fade: Option<Crossfade>,
    gain: f32,
    wants_play: bool,
    /// Resource for which preloading the next loop failed
    preload_failed: Option<ResourceId>,
    settings: CrossfadeSettings,
    ready_timeout_ms: u64,
    events: Sender<SwapEvent>,
}

impl TrackPlayer {
    /// Wrap `resource` (paused) at `gain`
    pub fn new(
        sound: Sound,
        mut resource: Box<dyn AudioResource>,
        gain: f32,
        settings: CrossfadeSettings,
        ready_timeout_ms: u64,
        events: Sender<SwapEvent>,
    ) -> Self {
        resource.set_gain(gain);
        Self {
            sound,
            current: Deck::new(resource),
            fade: None,
            gain,
            wants_play: false,
            preload_failed: None,
            settings,
            ready_timeout_ms,
            events,
        }
    }

    pub fn sound(&self) -> &Sound {
        &self.sound
    }

    pub fn sound_id(&self) -> &SoundId {
        &self.sound.id
    }

    /// Resource currently considered the track's own
    pub fn resource_id(&self) -> ResourceId {
        self.current.id()
    }

    /// Resource being faded in, if a crossfade is running
    pub fn incoming_id(&self) -> Option<ResourceId> {
        self.fade.as_ref().map(|fade| fade.incoming.id())
    }

    /// Target gain
    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn is_playing(&self) -> bool {
        self.current.handle.is_playing()
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn deck_state(&self) -> DeckState {
        self.current.state
    }

    /// Start playback, deferring until the resource is ready
    pub fn play(&mut self, now_ms: u64) {
        if self.current.state == DeckState::Released {
            return;
        }
        self.wants_play = true;

        if self.fade.is_some() || self.current.handle.is_playing() || self.current.is_starting() {
            return;
        }
        self.current.start(&self.sound.id, now_ms, self.ready_timeout_ms);
    }

    /// Pause playback; a running crossfade is cut short
    pub fn pause(&mut self) {
        self.wants_play = false;

        if self.fade.is_some() {
            self.abort_fade();
        } else {
            self.current.pause();
        }
    }

    /// Change the target gain, applied at the current fade progress
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
        if let Some(fade) = self.fade.as_mut() {
            fade.initial_gain = gain;
            fade.target_gain = gain;
            let p = self.settings.progress(fade.ticker.fired());
            let curve = self.settings.curve;
            self.current.handle.set_gain(gain * curve.gain_out(p));
            fade.incoming.handle.set_gain(gain * curve.gain_in(p));
        } else {
            self.current.handle.set_gain(gain);
        }
    }

    /// Cancel any fade and release every resource; no event is emitted
    pub fn stop(&mut self) {
        self.wants_play = false;
        if let Some(mut fade) = self.fade.take() {
            fade.ticker.cancel();
            fade.incoming.release();
        }
        self.current.release();
    }

    /// Advance deferred plays, the crossfade ramp, error recovery and loop scheduling
    pub fn poll(&mut self, now_ms: u64, backend: &mut dyn AudioBackend) {
        if self.current.state == DeckState::Released {
            return;
        }

        self.current.poll_pending(&self.sound.id, now_ms);

        if self.fade.is_some() {
            self.advance_fade(now_ms);
            return;
        }

        if let Some(error) = self.current.handle.take_error() {
            self.recover(&error, now_ms, backend);
            return;
        }

        if self.should_begin_fade() {
            self.begin_fade(now_ms, backend);
        }
    }

    fn should_begin_fade(&self) -> bool {
        if self.preload_failed == Some(self.current.id()) {
            return false;
        }
        let handle = &self.current.handle;
        let Some(duration) = handle.duration().filter(|d| !d.is_zero()) else {
            return false;
        };
        let remaining = duration.saturating_sub(handle.position());
        let near_end = remaining <= Duration::from_millis(self.settings.window_ms);

        near_end && (handle.is_playing() || (self.wants_play && handle.has_ended()))
    }

    fn begin_fade(&mut self, now_ms: u64, backend: &mut dyn AudioBackend) {
        let mut incoming = match backend.create(&self.sound) {
            Ok(handle) => Deck::new(handle),
            Err(e) => {
                tracing::warn!(sound = %self.sound.id, error = %e, "could not preload next loop");
                self.preload_failed = Some(self.current.id());
                return;
            }
        };

        let outgoing_playing = self.current.handle.is_playing();
        incoming.handle.set_gain(0.0);
        if outgoing_playing {
            incoming.start(&self.sound.id, now_ms, self.ready_timeout_ms);
        }

        tracing::debug!(
            sound = %self.sound.id,
            outgoing = %self.current.id(),
            incoming = %incoming.id(),
            "loop crossfade started"
        );

        self.current.state = DeckState::Fading;
        self.fade = Some(Crossfade {
            incoming,
            ticker: Ticker::bounded(now_ms, self.settings.step_interval_ms(), self.settings.steps),
            initial_gain: self.gain,
            target_gain: self.gain,
        });

        if !outgoing_playing {
            self.abort_fade();
        }
    }

    fn advance_fade(&mut self, now_ms: u64) {
        let Some(fade) = self.fade.as_mut() else {
            return;
        };

        fade.incoming.poll_pending(&self.sound.id, now_ms);
        let due = fade.ticker.poll(now_ms);
        if fade.ticker.is_finished() || self.current.handle.has_ended() {
            self.complete_fade();
            return;
        }
        if !self.current.handle.is_playing() {
            self.abort_fade();
            return;
        }
        if due > 0 {
            let p = self.settings.progress(fade.ticker.fired());
            let curve = self.settings.curve;
            self.current
                .handle
                .set_gain(fade.initial_gain * curve.gain_out(p));
            fade.incoming
                .handle
                .set_gain(fade.target_gain * curve.gain_in(p));
        }
    }

    fn complete_fade(&mut self) {
        let Some(mut fade) = self.fade.take() else {
            return;
        };
        fade.ticker.cancel();
        fade.incoming.handle.set_gain(fade.target_gain);
        self.adopt(fade.incoming, SwapCause::Crossfade);
    }

    fn abort_fade(&mut self) {
        let Some(mut fade) = self.fade.take() else {
            return;
        };
        fade.ticker.cancel();
        fade.incoming.pause();
        fade.incoming.handle.set_gain(fade.target_gain);
        self.adopt(fade.incoming, SwapCause::Aborted);
    }

    fn recover(&mut self, error: &str, now_ms: u64, backend: &mut dyn AudioBackend) {
        if self.current.recovery_attempted {
            tracing::debug!(sound = %self.sound.id, error, "resource error after recovery, ignored");
            return;
        }
        self.current.recovery_attempted = true;
        tracing::warn!(sound = %self.sound.id, resource = %self.current.id(), error, "resource error, replacing");

        let was_playing = self.current.handle.is_playing() || self.current.is_starting();
        let mut replacement = match backend.create(&self.sound) {
            Ok(handle) => Deck::new(handle),
            Err(e) => {
                tracing::error!(sound = %self.sound.id, error = %e, "could not replace failed resource");
                return;
            }
        };
        replacement.handle.set_gain(self.gain);
        if was_playing {
            replacement.start(&self.sound.id, now_ms, self.ready_timeout_ms);
        }
        self.adopt(replacement, SwapCause::Recovery);
    }

    /// Make `incoming` current, release the old resource and report the swap
    fn adopt(&mut self, incoming: Deck, cause: SwapCause) {
        let mut outgoing = std::mem::replace(&mut self.current, incoming);
        outgoing.release();
        self.current.state = DeckState::Idle;

        let event = SwapEvent {
            sound_id: self.sound.id.clone(),
            outgoing: outgoing.id(),
            incoming: self.current.id(),
            cause,
        };
        tracing::debug!(sound = %self.sound.id, ?cause, incoming = %event.incoming, "resource swapped");
        // Receiver gone means the session is shutting down
        self.events.send(event).ok();
    }
}

impl Drop for TrackPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
