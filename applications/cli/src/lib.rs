//! Hush CLI
//!
//! Terminal driver for the playback engine: configuration loading, the line
//! command language and its execution against a [`hush_playback::PlaybackSession`].

pub mod commands;
pub mod config;
pub mod error;

pub use commands::{execute, render_status, Command, CommandError, Flow};
pub use config::AppConfig;
pub use error::{CliError, Result};
