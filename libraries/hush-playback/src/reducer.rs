//! Pure state transitions
//!
//! [`reduce`] maps `(state, action)` to the next state plus a list of audio
//! [`Effect`]s for the mixer to execute. It never touches audio resources,
//! storage or the clock; time enters through action fields. This keeps every
//! transition testable in isolation.

use crate::config::MAX_CONCURRENT_TRACKS;
use crate::events::SwapEvent;
use crate::resource::ResourceId;
use crate::state::{ActiveTrack, PlaybackState};
use hush_core::{SavedTrack, SavedTrackSettings, Sound, SoundId, TimerOption};

/// State transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Add the sound to the mix, or remove it if already active
    ToggleTrack(Sound),
    SetTrackVolume { id: SoundId, volume: f32 },
    SetMasterVolume(f32),
    TogglePlayPause,
    SetTimer { option: TimerOption, now_ms: u64 },
    CancelTimer,
    /// Countdown tick with freshly computed remaining time
    TickTimer(u64),
    PauseAll,
    PlayAll,
    /// Replace the mix with the given sounds and volumes
    ApplyPreset { name: String, sounds: Vec<(Sound, f32)> },
    /// Replace saved settings wholesale (startup)
    RestoreState(SavedTrackSettings),
    /// Mixer created the resource for a spawned track
    ResourceAttached { id: SoundId, resource: ResourceId },
    /// A track player replaced its resource
    ResourceSwapped(SwapEvent),
}

/// Audio commands for the mixer
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Create a player for the sound at `gain`, starting it if `play`
    Spawn { sound: Sound, gain: f32, play: bool },
    /// Stop the player and release its resources
    Release { id: SoundId },
    SetGain { id: SoundId, gain: f32 },
    Play { id: SoundId },
    Pause { id: SoundId },
}

/// Result of a toggle request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// Mix already holds [`MAX_CONCURRENT_TRACKS`] sounds; nothing changed
    AtCapacity,
}

/// Result of swap reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Outgoing resource matched an active track
    Reconciled,
    /// Matched by sound id only (outgoing resource unknown)
    Recovered,
    /// No active track for the sound; state unchanged
    Dropped,
}

/// What a transition did, beyond the new state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Toggled(ToggleOutcome),
    Swapped(SwapOutcome),
}

/// Next state and the effects that realize it
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: PlaybackState,
    pub effects: Vec<Effect>,
    pub outcome: Outcome,
}

/// What [`Action::ToggleTrack`] would do for `id` in `state`
pub fn toggle_outcome(state: &PlaybackState, id: &str) -> ToggleOutcome {
    if state.is_active(id) {
        ToggleOutcome::Removed
    } else if state.is_full() {
        ToggleOutcome::AtCapacity
    } else {
        ToggleOutcome::Added
    }
}

/// How [`Action::ResourceSwapped`] would match `event` in `state`
pub fn swap_outcome(state: &PlaybackState, event: &SwapEvent) -> SwapOutcome {
    if state
        .tracks
        .iter()
        .any(|t| t.resource == Some(event.outgoing))
    {
        SwapOutcome::Reconciled
    } else if state.is_active(event.sound_id.as_str()) {
        SwapOutcome::Recovered
    } else {
        SwapOutcome::Dropped
    }
}

/// Compute the transition for `action`
pub fn reduce(state: &PlaybackState, action: Action) -> Transition {
    let mut next = state.clone();
    let mut effects = Vec::new();
    let mut outcome = Outcome::Applied;

    match action {
        Action::ToggleTrack(sound) => {
            let result = toggle_outcome(state, sound.id.as_str());
            match result {
                ToggleOutcome::Removed => {
                    next.tracks.retain(|t| t.sound.id != sound.id);
                    next.saved_track_settings.remove(&sound.id);
                    if next.tracks.is_empty() {
                        next.is_playing = false;
                    }
                    effects.push(Effect::Release { id: sound.id });
                }
                ToggleOutcome::AtCapacity => {}
                ToggleOutcome::Added => {
                    let is_playing = next.is_playing;
                    let saved = next
                        .saved_track_settings
                        .entry(sound.id.clone())
                        .or_insert_with(|| SavedTrack::from_gain(1.0, is_playing));
                    saved.was_playing = is_playing;
                    let volume = saved.gain();

                    effects.push(Effect::Spawn {
                        sound: sound.clone(),
                        gain: volume * next.master_volume,
                        play: is_playing,
                    });
                    next.tracks.push(ActiveTrack {
                        sound,
                        resource: None,
                        volume,
                    });
                }
            }
            outcome = Outcome::Toggled(result);
        }

        Action::SetTrackVolume { id, volume } => {
            let volume = unit(volume);
            let master = next.master_volume;
            let is_playing = next.is_playing;
            if let Some(track) = next.tracks.iter_mut().find(|t| t.sound.id == id) {
                track.volume = volume;
                effects.push(Effect::SetGain {
                    id: id.clone(),
                    gain: volume * master,
                });
                next.saved_track_settings
                    .entry(id)
                    .or_insert_with(|| SavedTrack::from_gain(volume, is_playing))
                    .volume = volume * 100.0;
            }
        }

        Action::SetMasterVolume(volume) => {
            let volume = unit(volume);
            next.master_volume = volume;
            effects.extend(next.tracks.iter().map(|t| Effect::SetGain {
                id: t.sound.id.clone(),
                gain: t.effective_gain(volume),
            }));
        }

        Action::TogglePlayPause => {
            let playing = !next.is_playing;
            set_playing(&mut next, &mut effects, playing);
        }

        Action::PauseAll => set_playing(&mut next, &mut effects, false),

        Action::PlayAll => set_playing(&mut next, &mut effects, true),

        Action::SetTimer { option, now_ms } => match option.duration_ms() {
            Some(remaining) => {
                next.timer = option;
                next.time_remaining_ms = Some(remaining);
                next.timer_deadline_ms = Some(now_ms.saturating_add(remaining));
            }
            None => clear_timer(&mut next),
        },

        Action::CancelTimer => clear_timer(&mut next),

        Action::TickTimer(remaining) => {
            next.time_remaining_ms = Some(remaining);
        }

        Action::ApplyPreset { name: _, sounds } => {
            let mut wanted: Vec<(Sound, f32)> = Vec::with_capacity(MAX_CONCURRENT_TRACKS);
            for (sound, volume) in sounds {
                if wanted.len() == MAX_CONCURRENT_TRACKS {
                    break;
                }
                if !wanted.iter().any(|(w, _)| w.id == sound.id) {
                    wanted.push((sound, unit(volume)));
                }
            }

            let removed: Vec<SoundId> = next
                .tracks
                .iter()
                .filter(|t| !wanted.iter().any(|(w, _)| w.id == t.sound.id))
                .map(|t| t.sound.id.clone())
                .collect();
            next.tracks.retain(|t| !removed.contains(&t.sound.id));
            for id in removed {
                next.saved_track_settings.remove(&id);
                effects.push(Effect::Release { id });
            }

            let master = next.master_volume;
            let is_playing = next.is_playing;
            for (sound, volume) in wanted {
                let saved = next
                    .saved_track_settings
                    .entry(sound.id.clone())
                    .or_insert_with(|| SavedTrack::from_gain(volume, is_playing));
                saved.volume = volume * 100.0;

                if let Some(track) = next.tracks.iter_mut().find(|t| t.sound.id == sound.id) {
                    track.volume = volume;
                    effects.push(Effect::SetGain {
                        id: sound.id,
                        gain: volume * master,
                    });
                } else {
                    effects.push(Effect::Spawn {
                        sound: sound.clone(),
                        gain: volume * master,
                        play: is_playing,
                    });
                    next.tracks.push(ActiveTrack {
                        sound,
                        resource: None,
                        volume,
                    });
                }
            }

            if next.tracks.is_empty() {
                next.is_playing = false;
            }
        }

        Action::RestoreState(saved) => {
            next.saved_track_settings = saved;
        }

        Action::ResourceAttached { id, resource } => {
            if let Some(track) = next.tracks.iter_mut().find(|t| t.sound.id == id) {
                track.resource = Some(resource);
            }
        }

        Action::ResourceSwapped(event) => {
            let result = swap_outcome(state, &event);
            let slot = match result {
                SwapOutcome::Reconciled => next
                    .tracks
                    .iter_mut()
                    .find(|t| t.resource == Some(event.outgoing)),
                SwapOutcome::Recovered => next
                    .tracks
                    .iter_mut()
                    .find(|t| t.sound.id == event.sound_id),
                SwapOutcome::Dropped => None,
            };
            if let Some(track) = slot {
                track.resource = Some(event.incoming);
                let id = track.sound.id.clone();
                effects.push(if next.is_playing {
                    Effect::Play { id }
                } else {
                    Effect::Pause { id }
                });
            }
            outcome = Outcome::Swapped(result);
        }
    }

    Transition {
        state: next,
        effects,
        outcome,
    }
}

/// Clamp to 0.0 - 1.0; NaN becomes silence
fn unit(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

fn set_playing(state: &mut PlaybackState, effects: &mut Vec<Effect>, playing: bool) {
    state.is_playing = playing;
    for track in &state.tracks {
        let id = track.sound.id.clone();
        if let Some(saved) = state.saved_track_settings.get_mut(&id) {
            saved.was_playing = playing;
        }
        effects.push(if playing {
            Effect::Play { id }
        } else {
            Effect::Pause { id }
        });
    }
}

fn clear_timer(state: &mut PlaybackState) {
    state.timer = TimerOption::Unbounded;
    state.time_remaining_ms = None;
    state.timer_deadline_ms = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SwapCause;
    use hush_core::SoundCategory;

    fn sound(id: &str) -> Sound {
        Sound::new(id, id, SoundCategory::Other, format!("{id}.mp3"))
    }

    fn with_tracks(ids: &[&str]) -> PlaybackState {
        ids.iter().fold(PlaybackState::default(), |state, id| {
            reduce(&state, Action::ToggleTrack(sound(id))).state
        })
    }

    #[test]
    fn toggle_adds_with_saved_volume() {
        let mut state = PlaybackState::default();
        state
            .saved_track_settings
            .insert(SoundId::new("rain"), SavedTrack::from_gain(0.5, false));

        let t = reduce(&state, Action::ToggleTrack(sound("rain")));
        assert_eq!(t.outcome, Outcome::Toggled(ToggleOutcome::Added));
        assert_eq!(t.state.tracks[0].volume, 0.5);
        assert_eq!(
            t.effects,
            vec![Effect::Spawn {
                sound: sound("rain"),
                gain: 0.5,
                play: false
            }]
        );
    }

    #[test]
    fn fourth_toggle_is_at_capacity() {
        let state = with_tracks(&["a", "b", "c"]);
        let t = reduce(&state, Action::ToggleTrack(sound("d")));
        assert_eq!(t.outcome, Outcome::Toggled(ToggleOutcome::AtCapacity));
        assert_eq!(t.state, state);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn removing_last_track_stops_playback() {
        let state = with_tracks(&["rain"]);
        let playing = reduce(&state, Action::TogglePlayPause).state;
        assert!(playing.is_playing);

        let t = reduce(&playing, Action::ToggleTrack(sound("rain")));
        assert_eq!(t.outcome, Outcome::Toggled(ToggleOutcome::Removed));
        assert!(!t.state.is_playing);
        assert!(t.state.saved_track_settings.is_empty());
        assert_eq!(
            t.effects,
            vec![Effect::Release {
                id: SoundId::new("rain")
            }]
        );
    }

    #[test]
    fn track_volume_is_clamped_and_saved() {
        let state = with_tracks(&["rain"]);
        let state = reduce(&state, Action::SetMasterVolume(0.5)).state;
        let t = reduce(
            &state,
            Action::SetTrackVolume {
                id: SoundId::new("rain"),
                volume: 1.4,
            },
        );
        assert_eq!(t.state.tracks[0].volume, 1.0);
        assert_eq!(t.state.saved_track_settings[&SoundId::new("rain")].volume, 100.0);
        assert_eq!(
            t.effects,
            vec![Effect::SetGain {
                id: SoundId::new("rain"),
                gain: 0.5
            }]
        );
    }

    #[test]
    fn volume_for_inactive_sound_is_noop() {
        let state = with_tracks(&["rain"]);
        let t = reduce(
            &state,
            Action::SetTrackVolume {
                id: SoundId::new("wind"),
                volume: 0.2,
            },
        );
        assert_eq!(t.state, state);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn timer_sets_deadline_and_cancel_clears() {
        let state = PlaybackState::default();
        let set = reduce(
            &state,
            Action::SetTimer {
                option: TimerOption::Minutes15,
                now_ms: 1_000,
            },
        )
        .state;
        assert_eq!(set.time_remaining_ms, Some(900_000));
        assert_eq!(set.timer_deadline_ms, Some(901_000));

        let ticked = reduce(&set, Action::TickTimer(899_000)).state;
        assert_eq!(ticked.time_remaining_ms, Some(899_000));

        let cancelled = reduce(&ticked, Action::CancelTimer).state;
        assert_eq!(cancelled.timer, TimerOption::Unbounded);
        assert_eq!(cancelled.time_remaining_ms, None);
        assert_eq!(cancelled.timer_deadline_ms, None);
    }

    #[test]
    fn preset_replaces_mix() {
        let state = with_tracks(&["rain", "fire"]);
        let t = reduce(
            &state,
            Action::ApplyPreset {
                name: "Breeze".into(),
                sounds: vec![(sound("rain"), 0.4), (sound("wind"), 0.3)],
            },
        );

        let ids: Vec<&str> = t.state.tracks.iter().map(|t| t.sound.id.as_str()).collect();
        assert_eq!(ids, ["rain", "wind"]);
        assert_eq!(t.state.tracks[0].volume, 0.4);
        assert!(!t.state.saved_track_settings.contains_key("fire"));
        assert!(t.effects.contains(&Effect::Release {
            id: SoundId::new("fire")
        }));
        assert!(t.effects.contains(&Effect::Spawn {
            sound: sound("wind"),
            gain: 0.3,
            play: false
        }));
    }

    #[test]
    fn preset_honours_three_distinct_sounds() {
        let t = reduce(
            &PlaybackState::default(),
            Action::ApplyPreset {
                name: "Big".into(),
                sounds: vec![
                    (sound("a"), 0.1),
                    (sound("a"), 0.9),
                    (sound("b"), 0.2),
                    (sound("c"), 0.3),
                    (sound("d"), 0.4),
                ],
            },
        );
        let ids: Vec<&str> = t.state.tracks.iter().map(|t| t.sound.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(t.state.tracks[0].volume, 0.1);
    }

    #[test]
    fn empty_preset_stops_playback() {
        let state = reduce(&with_tracks(&["rain"]), Action::PlayAll).state;
        let t = reduce(
            &state,
            Action::ApplyPreset {
                name: "Nothing".into(),
                sounds: Vec::new(),
            },
        );
        assert!(t.state.tracks.is_empty());
        assert!(!t.state.is_playing);
    }

    #[test]
    fn swap_matches_outgoing_resource() {
        let state = with_tracks(&["rain"]);
        let old = ResourceId::next();
        let new = ResourceId::next();
        let state = reduce(
            &state,
            Action::ResourceAttached {
                id: SoundId::new("rain"),
                resource: old,
            },
        )
        .state;

        let t = reduce(
            &state,
            Action::ResourceSwapped(SwapEvent {
                sound_id: SoundId::new("rain"),
                outgoing: old,
                incoming: new,
                cause: SwapCause::Crossfade,
            }),
        );
        assert_eq!(t.outcome, Outcome::Swapped(SwapOutcome::Reconciled));
        assert_eq!(t.state.tracks[0].resource, Some(new));
        assert_eq!(
            t.effects,
            vec![Effect::Pause {
                id: SoundId::new("rain")
            }]
        );
    }

    #[test]
    fn swap_falls_back_to_sound_id_then_drops() {
        let state = with_tracks(&["rain"]);
        let event = SwapEvent {
            sound_id: SoundId::new("rain"),
            outgoing: ResourceId::next(),
            incoming: ResourceId::next(),
            cause: SwapCause::Recovery,
        };
        let t = reduce(&state, Action::ResourceSwapped(event.clone()));
        assert_eq!(t.outcome, Outcome::Swapped(SwapOutcome::Recovered));
        assert_eq!(t.state.tracks[0].resource, Some(event.incoming));

        let stray = SwapEvent {
            sound_id: SoundId::new("wind"),
            ..event
        };
        let t = reduce(&state, Action::ResourceSwapped(stray));
        assert_eq!(t.outcome, Outcome::Swapped(SwapOutcome::Dropped));
        assert_eq!(t.state, state);
        assert!(t.effects.is_empty());
    }
}
