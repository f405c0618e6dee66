//! Track player looping tests
//!
//! Drive a `TrackPlayer` against the simulated backend with a manual clock
//! and check the crossfade ramp, abort, recovery and deferred-play paths.

use crossbeam_channel::Receiver;
use hush_core::{Sound, SoundCategory};
use hush_playback::{
    AudioBackend, Clock, CrossfadeSettings, DeckState, FadeCurve, ManualClock, ResourceId,
    SimulatedBackend, SwapCause, SwapEvent, TrackPlayer,
};
use std::sync::Arc;
use std::time::Duration;

// ===== Helpers =====

const GAIN: f32 = 0.35;

fn rain() -> Sound {
    Sound::new("rain", "Rain", SoundCategory::Water, "rain.mp3")
}

struct Rig {
    clock: ManualClock,
    backend: SimulatedBackend,
    player: TrackPlayer,
    events: Receiver<SwapEvent>,
    first: ResourceId,
}

impl Rig {
    fn new(configure: impl FnOnce(&SimulatedBackend)) -> Self {
        let clock = ManualClock::new();
        let mut backend = SimulatedBackend::new(Arc::new(clock.clone()));
        backend.set_length("rain", Duration::from_secs(10));
        configure(&backend);

        let (tx, events) = crossbeam_channel::unbounded();
        let resource = backend.create(&rain()).unwrap();
        let first = resource.id();
        let player = TrackPlayer::new(
            rain(),
            resource,
            GAIN,
            CrossfadeSettings::default(),
            5000,
            tx,
        );

        Self {
            clock,
            backend,
            player,
            events,
            first,
        }
    }

    fn advance(&mut self, ms: u64) {
        self.clock.advance(Duration::from_millis(ms));
        self.player.poll(self.clock.now_ms(), &mut self.backend);
    }

    fn play(&mut self) {
        self.player.play(self.clock.now_ms());
    }

    fn drain(&self) -> Vec<SwapEvent> {
        self.events.try_iter().collect()
    }
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-6
}

// ===== Crossfade =====

#[test]
fn crossfade_starts_three_seconds_before_end() {
    let mut rig = Rig::new(|_| {});
    rig.play();

    rig.advance(6_950);
    assert!(!rig.player.is_fading());

    rig.advance(50);
    assert!(rig.player.is_fading());
    assert_eq!(rig.player.deck_state(), DeckState::Fading);

    let incoming = rig.player.incoming_id().unwrap();
    let snap = rig.backend.snapshot(incoming).unwrap();
    assert!(snap.playing);
    assert_eq!(snap.gain, 0.0);
    assert_eq!(rig.backend.snapshot(rig.first).unwrap().gain, GAIN);
}

#[test]
fn ramp_follows_quadratic_steps() {
    let mut rig = Rig::new(|_| {});
    rig.play();
    rig.advance(7_000);
    let incoming = rig.player.incoming_id().unwrap();

    rig.advance(50);
    let p = 1.0f32 / 60.0;
    let out = rig.backend.snapshot(rig.first).unwrap().gain;
    let inc = rig.backend.snapshot(incoming).unwrap().gain;
    assert!(close(out, GAIN * FadeCurve::Quadratic.gain_out(p)), "outgoing {out}");
    assert!(close(inc, GAIN * FadeCurve::Quadratic.gain_in(p)), "incoming {inc}");

    // Missed steps are coalesced onto the latest due step
    rig.advance(1_450);
    let inc = rig.backend.snapshot(incoming).unwrap().gain;
    assert!(close(inc, GAIN * 0.25), "incoming {inc} at half way");
}

#[test]
fn completed_crossfade_snaps_gain_and_releases_outgoing() {
    let mut rig = Rig::new(|_| {});
    rig.play();
    rig.advance(7_000);
    let incoming = rig.player.incoming_id().unwrap();

    rig.advance(3_000);

    assert!(!rig.player.is_fading());
    assert_eq!(rig.player.resource_id(), incoming);
    assert_eq!(rig.player.deck_state(), DeckState::Idle);

    let snap = rig.backend.snapshot(incoming).unwrap();
    assert_eq!(snap.gain, GAIN);
    assert!(snap.playing);
    assert!(rig.backend.snapshot(rig.first).unwrap().released);

    let events = rig.drain();
    assert_eq!(
        events,
        vec![SwapEvent {
            sound_id: rain().id,
            outgoing: rig.first,
            incoming,
            cause: SwapCause::Crossfade,
        }]
    );
}

#[test]
fn adopted_resource_loops_again() {
    let mut rig = Rig::new(|_| {});
    rig.play();
    rig.advance(7_000);
    rig.advance(3_000);
    let second = rig.player.resource_id();
    rig.drain();

    // Second resource started at 7s, so it nears its end at 14s
    rig.advance(3_950);
    assert!(!rig.player.is_fading());
    rig.advance(50);
    assert!(rig.player.is_fading());

    rig.advance(3_000);
    let events = rig.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outgoing, second);
    assert_eq!(rig.backend.live_resources(), vec![rig.player.resource_id()]);
}

#[test]
fn pause_mid_fade_aborts_with_one_event() {
    let mut rig = Rig::new(|_| {});
    rig.play();
    rig.advance(7_000);
    let incoming = rig.player.incoming_id().unwrap();
    rig.advance(500);

    rig.player.pause();

    assert!(!rig.player.is_fading());
    assert_eq!(rig.player.resource_id(), incoming);
    let snap = rig.backend.snapshot(incoming).unwrap();
    assert!(!snap.playing);
    assert_eq!(snap.gain, GAIN);
    assert!(rig.backend.snapshot(rig.first).unwrap().released);

    rig.advance(5_000);
    let events = rig.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].cause, SwapCause::Aborted);
    assert_eq!(events[0].incoming, incoming);
}

#[test]
fn gain_change_mid_fade_applies_at_current_progress() {
    let mut rig = Rig::new(|_| {});
    rig.play();
    rig.advance(7_000);
    let incoming = rig.player.incoming_id().unwrap();
    rig.advance(1_500);

    rig.player.set_gain(0.8);

    assert!(close(rig.backend.snapshot(rig.first).unwrap().gain, 0.6));
    assert!(close(rig.backend.snapshot(incoming).unwrap().gain, 0.2));

    rig.advance(1_500);
    assert_eq!(rig.backend.snapshot(incoming).unwrap().gain, 0.8);
}

#[test]
fn stop_releases_everything_silently() {
    let mut rig = Rig::new(|_| {});
    rig.play();
    rig.advance(7_500);
    let incoming = rig.player.incoming_id().unwrap();

    rig.player.stop();

    assert_eq!(rig.player.deck_state(), DeckState::Released);
    assert!(rig.backend.snapshot(rig.first).unwrap().released);
    assert!(rig.backend.snapshot(incoming).unwrap().released);
    assert!(rig.backend.live_resources().is_empty());
    assert!(rig.drain().is_empty());
}

#[test]
fn failed_preload_is_not_retried_for_same_resource() {
    let mut rig = Rig::new(|_| {});
    rig.backend.fail_next_create("rain");
    rig.play();
    rig.advance(7_000);
    assert!(!rig.player.is_fading());

    rig.advance(50);
    assert!(!rig.player.is_fading());
    assert_eq!(rig.backend.resources_for("rain").len(), 1);
}

#[test]
fn loading_incoming_resource_starts_as_soon_as_ready() {
    let mut rig = Rig::new(|backend| backend.set_load_latency(Duration::from_millis(100)));
    rig.play();
    rig.advance(100);
    assert!(rig.player.is_playing());

    // First resource started at 100 ms, so its last 3 s begin at 7.1 s
    rig.advance(7_000);
    assert!(rig.player.is_fading());
    let incoming = rig.player.incoming_id().unwrap();
    assert!(!rig.backend.snapshot(incoming).unwrap().playing);

    let mut playing_steps = 0;
    for _ in 0..30 {
        rig.advance(50);
        if rig.backend.snapshot(incoming).unwrap().playing {
            playing_steps += 1;
        }
    }
    assert!(rig.player.is_fading());
    assert_eq!(playing_steps, 29);

    let snap = rig.backend.snapshot(incoming).unwrap();
    assert_eq!(snap.reloads, 0);
    assert_eq!(snap.play_calls, 1);

    rig.advance(1_500);
    assert!(!rig.player.is_fading());
    assert_eq!(rig.player.resource_id(), incoming);
    assert_eq!(rig.backend.snapshot(incoming).unwrap().gain, GAIN);
    assert!(rig.backend.snapshot(incoming).unwrap().playing);
    assert_eq!(rig.drain().len(), 1);
}

#[test]
fn pause_while_incoming_loads_cancels_its_start() {
    let mut rig = Rig::new(|backend| backend.set_load_latency(Duration::from_millis(500)));
    rig.play();
    rig.advance(500);
    rig.advance(7_000);
    let incoming = rig.player.incoming_id().unwrap();

    rig.player.pause();
    rig.advance(1_000);

    let snap = rig.backend.snapshot(incoming).unwrap();
    assert!(!snap.playing);
    assert_eq!(snap.play_calls, 0);
    assert_eq!(rig.player.resource_id(), incoming);
}

// ===== Recovery =====

#[test]
fn resource_error_is_recovered_once() {
    let mut rig = Rig::new(|_| {});
    rig.play();
    rig.advance(1_000);

    rig.backend.inject_error(rig.first, "decode error");
    rig.advance(50);

    let replacement = rig.player.resource_id();
    assert_ne!(replacement, rig.first);
    let snap = rig.backend.snapshot(replacement).unwrap();
    assert!(snap.playing);
    assert_eq!(snap.gain, GAIN);
    assert!(rig.backend.snapshot(rig.first).unwrap().released);

    let events = rig.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].cause, SwapCause::Recovery);
}

#[test]
fn recovery_replacement_waits_for_readiness() {
    let mut rig = Rig::new(|backend| backend.set_load_latency(Duration::from_millis(100)));
    rig.play();
    rig.advance(100);
    rig.advance(1_000);

    rig.backend.inject_error(rig.first, "decode error");
    rig.advance(50);
    let replacement = rig.player.resource_id();
    assert_ne!(replacement, rig.first);
    assert!(!rig.backend.snapshot(replacement).unwrap().playing);

    rig.advance(100);
    let snap = rig.backend.snapshot(replacement).unwrap();
    assert!(snap.playing);
    assert_eq!(snap.reloads, 0);
    assert_eq!(snap.gain, GAIN);

    let events = rig.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].cause, SwapCause::Recovery);
}

#[test]
fn recovery_is_not_repeated_after_failed_replacement() {
    let mut rig = Rig::new(|_| {});
    rig.play();
    rig.advance(1_000);

    rig.backend.fail_next_create("rain");
    rig.backend.inject_error(rig.first, "network error");
    rig.advance(50);
    assert_eq!(rig.player.resource_id(), rig.first);

    rig.backend.inject_error(rig.first, "network error");
    rig.advance(50);
    assert_eq!(rig.player.resource_id(), rig.first);
    assert_eq!(rig.backend.resources_for("rain").len(), 1);
    assert!(rig.drain().is_empty());
}

// ===== Start-up =====

#[test]
fn rejected_play_reloads_and_retries_once() {
    let mut rig = Rig::new(|backend| backend.reject_next_plays("rain", 1));
    rig.play();

    let snap = rig.backend.snapshot(rig.first).unwrap();
    assert!(snap.playing);
    assert_eq!(snap.reloads, 1);
    assert_eq!(snap.play_calls, 2);
}

#[test]
fn second_rejection_leaves_track_paused() {
    let mut rig = Rig::new(|backend| backend.reject_next_plays("rain", 2));
    rig.play();

    let snap = rig.backend.snapshot(rig.first).unwrap();
    assert!(!snap.playing);
    assert_eq!(snap.reloads, 1);
    assert_eq!(snap.play_calls, 2);
}

#[test]
fn rejected_play_after_reload_waits_for_readiness() {
    let mut rig = Rig::new(|backend| backend.set_load_latency(Duration::from_millis(100)));
    rig.advance(100);
    rig.backend.reject_next_plays("rain", 1);
    rig.play();
    assert!(!rig.player.is_playing());

    rig.advance(100);
    let snap = rig.backend.snapshot(rig.first).unwrap();
    assert!(snap.playing);
    assert_eq!(snap.reloads, 1);
    assert_eq!(snap.play_calls, 2);
}

#[test]
fn play_waits_for_readiness() {
    let mut rig = Rig::new(|backend| backend.set_load_latency(Duration::from_millis(200)));
    rig.play();
    assert!(!rig.player.is_playing());

    rig.advance(150);
    assert!(!rig.player.is_playing());
    rig.advance(50);
    assert!(rig.player.is_playing());
}

#[test]
fn deferred_play_gives_up_after_timeout() {
    let mut rig = Rig::new(|backend| backend.set_load_latency(Duration::from_secs(8)));
    rig.play();

    rig.advance(5_000);
    assert!(!rig.player.is_playing());

    rig.advance(3_000);
    assert!(!rig.player.is_playing());
    assert_eq!(rig.backend.snapshot(rig.first).unwrap().play_calls, 0);
}
