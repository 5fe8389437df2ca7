//! Top-level error for the binaries.

use crate::{
    audio_buffer::BufferError, config::ConfigError, emitter::EmitError, ingest::IngestError,
};
use std::{error::Error, fmt::Display, io};

/// Everything that can end a `pointillism` or `monitor` invocation early.
#[derive(Debug)]
pub enum PointError {
    /// The recording could not be loaded
    Ingest(IngestError),
    /// The configuration could not be loaded or is invalid
    Config(ConfigError),
    /// The OSC destination could not be set up
    Emit(EmitError),
    /// A WAV file could not be written
    Wav(hound::Error),
    /// Samples did not form a buffer
    Buffer(BufferError),
    /// Terminal or socket trouble
    IOError(io::Error),
}

impl Display for PointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointError::Ingest(e) => write!(f, "{}", e),
            PointError::Config(e) => write!(f, "{}", e),
            PointError::Emit(e) => write!(f, "{}", e),
            PointError::Wav(e) => write!(f, "failed to write file: {}", e),
            PointError::Buffer(e) => write!(f, "{}", e),
            PointError::IOError(e) => write!(f, "{}", e),
        }
    }
}

impl Error for PointError {}

impl From<IngestError> for PointError {
    fn from(value: IngestError) -> Self {
        Self::Ingest(value)
    }
}

impl From<ConfigError> for PointError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<EmitError> for PointError {
    fn from(value: EmitError) -> Self {
        Self::Emit(value)
    }
}

impl From<hound::Error> for PointError {
    fn from(value: hound::Error) -> Self {
        Self::Wav(value)
    }
}

impl From<BufferError> for PointError {
    fn from(value: BufferError) -> Self {
        Self::Buffer(value)
    }
}

impl From<io::Error> for PointError {
    fn from(value: io::Error) -> Self {
        Self::IOError(value)
    }
}
