/// Countdown timer options
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Selectable countdown durations
///
/// Serialized as `"infinite"` or `"<minutes>min"` (e.g. `"15min"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimerOption {
    /// No countdown
    #[default]
    Unbounded,
    Minutes5,
    Minutes15,
    Minutes30,
    Minutes45,
    Minutes60,
    Minutes75,
    Minutes90,
}

impl TimerOption {
    /// All options in display order
    pub const ALL: [TimerOption; 8] = [
        TimerOption::Unbounded,
        TimerOption::Minutes5,
        TimerOption::Minutes15,
        TimerOption::Minutes30,
        TimerOption::Minutes45,
        TimerOption::Minutes60,
        TimerOption::Minutes75,
        TimerOption::Minutes90,
    ];

    /// Minute count, `None` for the unbounded option
    pub fn minutes(&self) -> Option<u64> {
        match self {
            Self::Unbounded => None,
            Self::Minutes5 => Some(5),
            Self::Minutes15 => Some(15),
            Self::Minutes30 => Some(30),
            Self::Minutes45 => Some(45),
            Self::Minutes60 => Some(60),
            Self::Minutes75 => Some(75),
            Self::Minutes90 => Some(90),
        }
    }

    /// Countdown length in milliseconds
    pub fn duration_ms(&self) -> Option<u64> {
        self.minutes().map(|m| m * 60_000)
    }

    /// Countdown length
    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms().map(Duration::from_millis)
    }

    pub fn is_bounded(&self) -> bool {
        !matches!(self, Self::Unbounded)
    }

    /// Look up the option for a minute count
    pub fn from_minutes(minutes: u64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|option| option.minutes() == Some(minutes))
    }
}

impl fmt::Display for TimerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minutes() {
            Some(minutes) => write!(f, "{}min", minutes),
            None => f.write_str("infinite"),
        }
    }
}

impl FromStr for TimerOption {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if matches!(s.as_str(), "infinite" | "unbounded" | "off" | "none") {
            return Ok(Self::Unbounded);
        }

        let digits = s.strip_suffix("min").unwrap_or(&s).trim();
        digits
            .parse::<u64>()
            .ok()
            .and_then(Self::from_minutes)
            .ok_or_else(|| CoreError::invalid_input(format!("unknown timer option '{}'", s)))
    }
}

impl TryFrom<String> for TimerOption {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimerOption> for String {
    fn from(option: TimerOption) -> Self {
        option.to_string()
    }
}
