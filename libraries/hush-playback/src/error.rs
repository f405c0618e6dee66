//! Error types for playback management

use hush_core::CoreError;
use thiserror::Error;

/// Errors reported by audio resources and backends
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The resource refused to start (unsupported or not loaded source)
    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),

    /// The resource has not finished loading yet
    #[error("Resource not ready")]
    NotReady,

    /// The backend could not create a resource
    #[error("Audio resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// The resource was already released
    #[error("Resource released")]
    Released,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Errors returned by the session's public operations
#[derive(Debug, Error)]
pub enum SessionError {
    /// Volume was NaN or infinite
    #[error("Invalid volume: {0}")]
    InvalidVolume(f32),

    /// Sound id not present in the catalog
    #[error("Unknown sound: {0}")]
    UnknownSound(String),

    /// No built-in or custom mix with that name
    #[error("Unknown mix: {0}")]
    UnknownMix(String),

    /// Custom mix failed validation
    #[error("Invalid mix: {0}")]
    InvalidMix(String),

    /// Core error (catalog, storage)
    #[error(transparent)]
    Core(#[from] CoreError),
}
