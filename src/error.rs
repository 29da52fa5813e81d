//! Error type shared by the profile store, the refiner and the command layer.

use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced to the user as a single message.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// No profile directory exists for the given name or id.
    #[error("voice '{0}' does not exist")]
    NotFound(String),
    /// A profile with the same sanitized id already exists.
    #[error("voice '{name}' already exists (id '{id}')")]
    AlreadyExists { name: String, id: String },
    /// The name sanitizes to an empty id.
    #[error("'{0}' is not a usable voice name (it contains no letters, digits, '_' or '-')")]
    InvalidName(String),
    /// Refinement was requested but the profile has no raw recordings.
    #[error("voice '{0}' has no recordings to refine")]
    Empty(String),
    /// Synthesis was requested but the profile has no usable reference audio.
    #[error("voice '{0}' has no reference audio")]
    NoReference(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// WAV decode/encode failure on a specific file.
    #[error("failed to process {}: {source}", .path.display())]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
    #[error("invalid metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("recording failed: {0}")]
    Capture(String),
    #[error("resampling failed: {0}")]
    Resample(String),
    #[error("synthesis failed: {0}")]
    Synthesis(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl VoiceError {
    pub(crate) fn wav(path: impl Into<PathBuf>, source: hound::Error) -> Self {
        Self::Wav { path: path.into(), source }
    }
}

pub type Result<T, E = VoiceError> = std::result::Result<T, E>;
