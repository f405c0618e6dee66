//! Line commands
//!
//! Parses one line of user input into a [`Command`] and runs it against a
//! [`PlaybackSession`]. Volumes are typed as percentages (0-100).

use hush_core::{Preset, TimerOption};
use hush_playback::{PlaybackSession, PlaybackState, SessionError, ToggleOutcome};
use std::fmt::Write as _;
use std::str::FromStr;
use thiserror::Error;

pub const HELP: &str = "\
commands:
  sounds                         list available sounds
  mixes                          list built-in and custom mixes
  toggle <sound>                 add or remove a sound
  volume <sound> <0-100>         set a sound's volume
  master <0-100>                 set the master volume
  play | pause | toggle-play     control playback
  timer <5|15|30|45|60|75|90|off> set the sleep timer
  cancel                         cancel the sleep timer
  mix <name>                     apply a mix
  save-mix <name> <sound>=<0-100>...  save a custom mix
  delete-mix <name>              delete a custom mix
  status                         show the current mix
  state                          dump the state as JSON
  quit                           exit";

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("not a percentage: {0}")]
    InvalidPercent(String),

    #[error("invalid timer: {0}")]
    InvalidTimer(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Sounds,
    Mixes,
    Toggle(String),
    Volume { sound: String, volume: f32 },
    Master(f32),
    Play,
    Pause,
    TogglePlay,
    Timer(TimerOption),
    Cancel,
    Mix(String),
    SaveMix(Preset),
    DeleteMix(String),
    Status,
    State,
    Quit,
}

/// What the driver should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue(String),
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(CommandError::Empty);
        };
        let rest: Vec<&str> = words.collect();

        let command = match (head.to_ascii_lowercase().as_str(), rest.as_slice()) {
            ("help" | "?", []) => Command::Help,
            ("sounds", []) => Command::Sounds,
            ("mixes", []) => Command::Mixes,
            ("toggle" | "t", [sound]) => Command::Toggle((*sound).to_string()),
            ("toggle" | "t", _) => return Err(CommandError::Usage("toggle <sound>")),
            ("volume" | "vol", [sound, percent]) => Command::Volume {
                sound: (*sound).to_string(),
                volume: parse_percent(percent)?,
            },
            ("volume" | "vol", _) => return Err(CommandError::Usage("volume <sound> <0-100>")),
            ("master", [percent]) => Command::Master(parse_percent(percent)?),
            ("master", _) => return Err(CommandError::Usage("master <0-100>")),
            ("play", []) => Command::Play,
            ("pause", []) => Command::Pause,
            ("toggle-play" | "p", []) => Command::TogglePlay,
            ("timer", [option]) => Command::Timer(
                option
                    .parse()
                    .map_err(|_| CommandError::InvalidTimer((*option).to_string()))?,
            ),
            ("timer", _) => return Err(CommandError::Usage("timer <minutes|off>")),
            ("cancel", []) => Command::Cancel,
            ("mix", name) if !name.is_empty() => Command::Mix(name.join(" ")),
            ("mix", _) => return Err(CommandError::Usage("mix <name>")),
            ("save-mix", [name, entries @ ..]) if !entries.is_empty() => {
                let mut preset = Preset::new(*name, "");
                for entry in entries {
                    let Some((sound, percent)) = entry.split_once('=') else {
                        return Err(CommandError::Usage("save-mix <name> <sound>=<0-100>..."));
                    };
                    preset = preset.with_sound(sound, parse_percent(percent)?);
                }
                Command::SaveMix(preset)
            }
            ("save-mix", _) => {
                return Err(CommandError::Usage("save-mix <name> <sound>=<0-100>..."))
            }
            ("delete-mix", name) if !name.is_empty() => Command::DeleteMix(name.join(" ")),
            ("delete-mix", _) => return Err(CommandError::Usage("delete-mix <name>")),
            ("status" | "s", []) => Command::Status,
            ("state", []) => Command::State,
            ("quit" | "exit" | "q", []) => Command::Quit,
            _ => return Err(CommandError::Unknown(line.trim().to_string())),
        };
        Ok(command)
    }
}

fn parse_percent(raw: &str) -> Result<f32, CommandError> {
    let value: f32 = raw
        .trim_end_matches('%')
        .parse()
        .map_err(|_| CommandError::InvalidPercent(raw.to_string()))?;
    if !(0.0..=100.0).contains(&value) {
        return Err(CommandError::InvalidPercent(raw.to_string()));
    }
    Ok(value / 100.0)
}

/// Run a command and describe the result
pub fn execute(session: &mut PlaybackSession, command: Command) -> Result<Flow, SessionError> {
    let reply = match command {
        Command::Help => HELP.to_string(),
        Command::Sounds => session
            .catalog()
            .sounds()
            .iter()
            .map(|s| format!("{:<12} {} ({})", s.id, s.name, s.category))
            .collect::<Vec<_>>()
            .join("\n"),
        Command::Mixes => {
            let mut out = String::new();
            for mix in session.custom_mixes() {
                let _ = writeln!(out, "* {}", describe_mix(mix));
            }
            for mix in session.catalog().presets() {
                let _ = writeln!(out, "  {}", describe_mix(mix));
            }
            out.trim_end().to_string()
        }
        Command::Toggle(sound) => match session.toggle_track(&sound)? {
            ToggleOutcome::Added => format!("added {sound}"),
            ToggleOutcome::Removed => format!("removed {sound}"),
            ToggleOutcome::AtCapacity => format!("mix is full, {sound} not added"),
        },
        Command::Volume { sound, volume } => {
            session.set_volume_for_sound(&sound, volume)?;
            if session.state().is_active(&sound) {
                format!("{sound} at {}", percent(volume))
            } else {
                format!("{sound} is not in the mix")
            }
        }
        Command::Master(volume) => {
            session.set_master_volume(volume)?;
            format!("master at {}", percent(volume))
        }
        Command::Play => {
            session.play_all_sounds();
            "playing".to_string()
        }
        Command::Pause => {
            session.pause_all_sounds();
            "paused".to_string()
        }
        Command::TogglePlay => {
            if session.toggle_play_pause() {
                "playing".to_string()
            } else {
                "paused".to_string()
            }
        }
        Command::Timer(option) => {
            session.set_timer(option);
            format!("timer {option}")
        }
        Command::Cancel => {
            session.cancel_timer();
            "timer cancelled".to_string()
        }
        Command::Mix(name) => {
            session.apply_mix_named(&name)?;
            format!("applied {name}")
        }
        Command::SaveMix(preset) => {
            let name = preset.name.clone();
            session.save_custom_mix(preset)?;
            format!("saved {name}")
        }
        Command::DeleteMix(name) => {
            if session.delete_custom_mix(&name) {
                format!("deleted {name}")
            } else {
                format!("no custom mix named {name}")
            }
        }
        Command::Status => render_status(session.state()),
        Command::State => serde_json::to_string_pretty(session.state())
            .unwrap_or_else(|e| format!("could not serialize state: {e}")),
        Command::Quit => return Ok(Flow::Quit),
    };
    Ok(Flow::Continue(reply))
}

fn describe_mix(mix: &Preset) -> String {
    let sounds: Vec<String> = mix
        .sounds
        .iter()
        .map(|s| format!("{} {}", s.id, percent(s.volume)))
        .collect();
    format!("{} [{}]", mix.name, sounds.join(", "))
}

fn percent(volume: f32) -> String {
    format!("{:.0}%", volume * 100.0)
}

/// Human-readable summary of the mix
pub fn render_status(state: &PlaybackState) -> String {
    let mut out = format!(
        "{} | master {}",
        if state.is_playing { "playing" } else { "paused" },
        percent(state.master_volume)
    );
    if let Some(remaining) = state.time_remaining_ms {
        let secs = remaining / 1000;
        let _ = write!(out, " | timer {}:{:02}", secs / 60, secs % 60);
    }
    if state.tracks.is_empty() {
        out.push_str("\n  (no sounds)");
    }
    for track in &state.tracks {
        let _ = write!(
            out,
            "\n  {:<12} {:>4}",
            track.sound.id,
            percent(track.volume)
        );
    }
    out
}
