//! Command execution against a file-backed session

use hush_cli::{execute, Command, Flow};
use hush_core::FileStore;
use hush_playback::{ManualClock, PlaybackSession, SimulatedBackend};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn session(dir: &TempDir, clock: &ManualClock) -> PlaybackSession {
    let backend = SimulatedBackend::new(Arc::new(clock.clone()));
    PlaybackSession::builder()
        .store(FileStore::new(dir.path()))
        .clock(Arc::new(clock.clone()))
        .start(backend)
}

fn run(session: &mut PlaybackSession, line: &str) -> String {
    let command: Command = line.parse().unwrap();
    match execute(session, command).unwrap() {
        Flow::Continue(reply) => reply,
        Flow::Quit => panic!("unexpected quit for '{line}'"),
    }
}

#[test]
fn toggle_volume_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new();
    let mut session = session(&dir, &clock);

    assert_eq!(run(&mut session, "toggle rain"), "added rain");
    assert_eq!(run(&mut session, "volume rain 40"), "rain at 40%");
    assert_eq!(run(&mut session, "volume fire 40"), "fire is not in the mix");
    assert_eq!(run(&mut session, "play"), "playing");

    let status = run(&mut session, "status");
    assert!(status.starts_with("playing | master 100%"), "{status}");
    assert!(status.contains("rain"));
    assert!(status.contains("40%"));
}

#[test]
fn fourth_sound_reports_full_mix() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new();
    let mut session = session(&dir, &clock);

    for id in ["rain", "wind", "fire"] {
        run(&mut session, &format!("toggle {id}"));
    }
    assert_eq!(run(&mut session, "toggle birds"), "mix is full, birds not added");
    assert_eq!(session.state().tracks.len(), 3);
}

#[test]
fn unknown_sound_is_a_session_error() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new();
    let mut session = session(&dir, &clock);

    let err = execute(&mut session, Command::Toggle("harp".into())).unwrap_err();
    assert!(err.to_string().contains("harp"));
}

#[test]
fn mix_is_case_insensitive_for_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new();
    let mut session = session(&dir, &clock);

    assert_eq!(run(&mut session, "mix ocean breeze"), "applied ocean breeze");
    let ids: Vec<&str> = session
        .state()
        .tracks
        .iter()
        .map(|t| t.sound.id.as_str())
        .collect();
    assert_eq!(ids, ["waves", "wind", "birds"]);
}

#[test]
fn settings_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new();
    {
        let mut session = session(&dir, &clock);
        run(&mut session, "toggle rain");
        run(&mut session, "volume rain 50");
        run(&mut session, "save-mix Night rain=30 night=60");
        session.teardown();
    }

    let session = session(&dir, &clock);
    let rain = session.state().track("rain").unwrap();
    assert_eq!(rain.volume, 0.5);
    assert!(!session.state().is_playing);
    assert_eq!(session.custom_mixes().len(), 1);
    assert_eq!(session.custom_mixes()[0].name, "Night");
}

#[test]
fn timer_countdown_shows_in_status() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new();
    let mut session = session(&dir, &clock);

    run(&mut session, "toggle rain");
    run(&mut session, "play");
    assert_eq!(run(&mut session, "timer 5"), "timer 5min");

    clock.advance(Duration::from_secs(60));
    session.poll();
    assert!(run(&mut session, "status").contains("timer 4:00"));

    assert_eq!(run(&mut session, "cancel"), "timer cancelled");
    assert!(!run(&mut session, "status").contains("timer"));
}

#[test]
fn state_dumps_camel_case_json() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new();
    let mut session = session(&dir, &clock);
    run(&mut session, "toggle rain");

    let json: serde_json::Value = serde_json::from_str(&run(&mut session, "state")).unwrap();
    assert_eq!(json["isPlaying"], false);
    assert_eq!(json["masterVolume"], 1.0);
}

#[test]
fn quit_stops_the_driver() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new();
    let mut session = session(&dir, &clock);
    assert_eq!(execute(&mut session, Command::Quit).unwrap(), Flow::Quit);
}
