/// Application configuration
use crate::error::{CliError, Result};
use hush_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "hush.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default)]
    pub catalog: CatalogSettings,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default = "default_driver")]
    pub driver: DriverSettings,

    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Directory holding the persisted settings files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogSettings {
    /// JSON catalog replacing the built-in sounds and mixes
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DriverSettings {
    /// How often the session is polled
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Length of each simulated sound file
    #[serde(default = "default_track_length_secs")]
    pub track_length_secs: u64,
}

impl AppConfig {
    /// Load from an optional TOML file and `HUSH_`-prefixed environment variables
    ///
    /// Nested keys use a double underscore, e.g. `HUSH_DRIVER__POLL_INTERVAL_MS`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("HUSH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.driver.poll_interval_ms == 0 {
            return Err(CliError::Config(
                "driver.poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.driver.track_length_secs == 0 {
            return Err(CliError::Config(
                "driver.track_length_secs must be positive".to_string(),
            ));
        }
        if self.playback.crossfade.steps == 0 {
            return Err(CliError::Config(
                "playback.crossfade.steps must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// Default values
fn default_storage() -> StorageSettings {
    StorageSettings {
        data_dir: default_data_dir(),
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("hush"))
        .unwrap_or_else(|| PathBuf::from("./hush_data"))
}

fn default_driver() -> DriverSettings {
    DriverSettings {
        poll_interval_ms: default_poll_interval_ms(),
        track_length_secs: default_track_length_secs(),
    }
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_track_length_secs() -> u64 {
    60
}

fn default_log_filter() -> String {
    "hush=info,hush_cli=info,hush_playback=info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            catalog: CatalogSettings::default(),
            playback: PlaybackConfig::default(),
            driver: default_driver(),
            log_filter: default_log_filter(),
        }
    }
}
