//! Playback events
//!
//! Two kinds of events leave the engine:
//! - [`SwapEvent`]: a track player replaced its resource (loop crossfade
//!   finished or was cut short, or error recovery). Sent over a channel to
//!   the session, which reconciles its state.
//! - [`Notice`]: short user-facing notifications (track added, timer
//!   elapsed, ...) drained by the UI layer.

use crate::resource::ResourceId;
use hush_core::{SoundId, TimerOption};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a player swapped resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapCause {
    /// Loop crossfade ran to completion
    Crossfade,
    /// Loop crossfade cut short by pause or interruption
    Aborted,
    /// Errored resource replaced by a fresh one
    Recovery,
}

/// A player replaced `outgoing` with `incoming` for `sound_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapEvent {
    pub sound_id: SoundId,
    pub outgoing: ResourceId,
    pub incoming: ResourceId,
    pub cause: SwapCause,
}

/// User-facing notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    TrackAdded { id: SoundId, name: String },
    TrackRemoved { id: SoundId, name: String },
    /// Toggle refused because the mix is full
    CapacityReached { id: SoundId, max: usize },
    TimerSet { option: TimerOption },
    TimerCancelled,
    TimerElapsed,
    MixApplied { name: String },
    MixSaved { name: String },
    MixDeleted { name: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::TrackAdded { name, .. } => write!(f, "{name} added to mix"),
            Notice::TrackRemoved { name, .. } => write!(f, "{name} removed from mix"),
            Notice::CapacityReached { max, .. } => {
                write!(f, "You can mix up to {max} sounds at a time")
            }
            Notice::TimerSet { option } => match option.minutes() {
                Some(minutes) => write!(f, "Sleep timer set for {minutes} minutes"),
                None => write!(f, "Sleep timer off"),
            },
            Notice::TimerCancelled => write!(f, "Sleep timer cancelled"),
            Notice::TimerElapsed => write!(f, "Sleep timer finished, sounds paused"),
            Notice::MixApplied { name } => write!(f, "Playing {name}"),
            Notice::MixSaved { name } => write!(f, "Saved mix {name}"),
            Notice::MixDeleted { name } => write!(f, "Deleted mix {name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_serializes_with_kind_tag() {
        let notice = Notice::MixApplied {
            name: "Thunderstorm".into(),
        };
        let json = serde_json::to_string(&notice).unwrap();
        assert_eq!(json, r#"{"kind":"mix_applied","name":"Thunderstorm"}"#);
    }

    #[test]
    fn notice_messages() {
        let set = Notice::TimerSet {
            option: TimerOption::Minutes15,
        };
        assert_eq!(set.to_string(), "Sleep timer set for 15 minutes");
        let full = Notice::CapacityReached {
            id: SoundId::new("fire"),
            max: 3,
        };
        assert_eq!(full.to_string(), "You can mix up to 3 sounds at a time");
    }
}
