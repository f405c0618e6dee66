mod preset;
mod settings;
mod sound;
mod timer;

pub use preset::{Preset, PresetSound, MAX_PRESET_SOUNDS};
pub use settings::{SavedTrack, SavedTrackSettings};
pub use sound::{Sound, SoundCategory, SoundId};
pub use timer::TimerOption;
