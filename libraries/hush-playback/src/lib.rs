//! Hush - Playback Engine
//!
//! Platform-agnostic playback engine for the Hush ambient mixer.
//!
//! This crate provides:
//! - Gapless looping of each sound via timed crossfades
//! - Up to three concurrently mixed sounds with per-track and master volume
//! - A pure state reducer with audio effects returned as data
//! - A sleep timer that pauses everything when it elapses
//! - Built-in and custom mixes (presets)
//! - Persistence of per-sound volume and play state
//!
//! # Architecture
//!
//! `hush-playback` never talks to an audio device directly. Platform audio is
//! provided through the [`AudioBackend`] and [`AudioResource`] traits; time
//! comes from a [`Clock`]. A [`SimulatedBackend`] drives everything headless.
//!
//! # Example
//!
//! ```rust
//! use hush_playback::{ManualClock, PlaybackSession, SimulatedBackend, ToggleOutcome};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let backend = SimulatedBackend::new(Arc::new(clock.clone()));
//! let mut session = PlaybackSession::builder()
//!     .clock(Arc::new(clock.clone()))
//!     .start(backend);
//!
//! assert_eq!(session.toggle_track("rain").unwrap(), ToggleOutcome::Added);
//! session.set_master_volume(0.5).unwrap();
//! assert!(session.toggle_play_pause());
//!
//! clock.advance(Duration::from_millis(50));
//! session.poll();
//! assert_eq!(session.state().effective_gain("rain"), Some(0.5));
//! ```

#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod countdown;
pub mod error;
pub mod events;
pub mod fade;
pub mod mixer;
pub mod reducer;
pub mod resource;
pub mod schedule;
pub mod session;
pub mod sim;
pub mod state;
pub mod track;
pub mod unlock;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{PlaybackConfig, MAX_CONCURRENT_TRACKS, TIMER_TICK_MS};
pub use countdown::{Countdown, CountdownEvent};
pub use error::{PlaybackError, Result, SessionError};
pub use events::{Notice, SwapCause, SwapEvent};
pub use fade::{CrossfadeSettings, FadeCurve};
pub use mixer::Mixer;
pub use reducer::{reduce, Action, Effect, Outcome, SwapOutcome, ToggleOutcome, Transition};
pub use resource::{AudioBackend, AudioResource, ResourceId};
pub use schedule::Ticker;
pub use session::{PlaybackSession, SessionBuilder, SubscriptionId};
pub use sim::SimulatedBackend;
pub use state::{ActiveTrack, PlaybackState};
pub use track::{DeckState, TrackPlayer};
pub use unlock::{Interaction, UnlockGate};
