//! Loads a first-order Ambisonic recording from a WAV (or `.amb`) file.
//!
//! Both integer PCM and float files are accepted. Integer samples are
//! scaled by `2^(bits-1)` so that every decode path hands the analysis
//! samples in roughly [-1, 1]; the normalizer takes care of the rest.
//!
//! `.amb` files are WAVE_FORMAT_EXTENSIBLE files whose subformat carries the
//! Ambisonic B-format GUID instead of the plain PCM or float one. hound only
//! knows the latter, so the subformat is rewritten in memory before
//! decoding.

use crate::audio_buffer::{AudioBuffer, BufferError};
use hound::{SampleFormat, WavReader};
use std::{
    borrow::Cow,
    fmt, fs,
    io::{self, Cursor, Read},
    path::{Path, PathBuf},
};

const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Tail shared by the KSDATAFORMAT subtypes, `xxxxxxxx-0000-0010-8000-00aa00389b71`.
const KSDATAFORMAT_TAIL: [u8; 12] = [
    0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xaa, 0x00, 0x38, 0x9b, 0x71,
];

/// Tail shared by the Ambisonic B-format subtypes, `xxxxxxxx-0721-11d3-8644-c8c1ca000000`.
const AMBISONIC_B_FORMAT_TAIL: [u8; 12] = [
    0x21, 0x07, 0xd3, 0x11, 0x86, 0x44, 0xc8, 0xc1, 0xca, 0x00, 0x00, 0x00,
];

/// Anything that prevents a recording from becoming an [AudioBuffer]. All
/// of these stop the run before a single message is sent.
#[derive(Debug)]
pub enum IngestError {
    /// There is no file at the given path.
    NotFound(PathBuf),

    /// The file exists but could not be read.
    Io(io::Error),

    /// hound could not decode the file.
    Decode(hound::Error),

    /// The file has fewer than four channels.
    InsufficientChannels {
        /// Channel count found in the file
        found: usize,
    },

    /// The decoded samples do not form a usable buffer.
    Buffer(BufferError),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            IngestError::NotFound(path) => {
                Cow::from(format!("file '{}' not found", path.display()))
            }
            IngestError::Io(error) => Cow::from(format!("failed to read file: {}", error)),
            IngestError::Decode(error) => Cow::from(format!("failed to load file: {}", error)),
            IngestError::InsufficientChannels { found } => Cow::from(format!(
                "expected at least 4 channels but got {}",
                found
            )),
            IngestError::Buffer(error) => Cow::from(format!("bad recording: {}", error)),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for IngestError {}

impl From<io::Error> for IngestError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<hound::Error> for IngestError {
    fn from(value: hound::Error) -> Self {
        Self::Decode(value)
    }
}

impl From<BufferError> for IngestError {
    fn from(value: BufferError) -> Self {
        match value {
            BufferError::TooFewChannels { found } => Self::InsufficientChannels { found },
            other => Self::Buffer(other),
        }
    }
}

/// Opens and decodes the recording at `path`.
pub fn load_b_format(path: impl AsRef<Path>) -> Result<AudioBuffer, IngestError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IngestError::NotFound(path.to_path_buf()));
    }

    let mut bytes = fs::read(path)?;
    patch_ambisonic_subformat(&mut bytes);
    read_b_format(WavReader::new(Cursor::new(bytes))?)
}

/// Rewrites an Ambisonic B-format subformat GUID in the `fmt ` chunk into
/// the matching KSDATAFORMAT one, keeping the format code (1 for PCM, 3 for
/// float). Returns whether anything changed. Bytes that are not a RIFF WAVE
/// file are left alone for hound to reject.
pub fn patch_ambisonic_subformat(bytes: &mut [u8]) -> bool {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return false;
    }

    let mut pos = 12;
    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = u32::from_le_bytes([
            bytes[pos + 4],
            bytes[pos + 5],
            bytes[pos + 6],
            bytes[pos + 7],
        ]) as usize;
        let body = pos + 8;

        if id == b"fmt " {
            let tag = bytes.get(body..body + 2).map(|b| u16::from_le_bytes([b[0], b[1]]));
            if size < 40 || tag != Some(WAVE_FORMAT_EXTENSIBLE) {
                return false;
            }
            // the subformat GUID sits at offset 24 of an extensible fmt chunk
            return match bytes.get_mut(body + 28..body + 40) {
                Some(tail) if *tail == AMBISONIC_B_FORMAT_TAIL => {
                    tail.copy_from_slice(&KSDATAFORMAT_TAIL);
                    true
                }
                _ => false,
            };
        }

        // chunks are padded to an even length
        pos = match body.checked_add(size + (size & 1)) {
            Some(next) => next,
            None => return false,
        };
    }
    false
}

/// Decodes a recording from an already opened WAV stream.
pub fn read_b_format<R: Read>(reader: WavReader<R>) -> Result<AudioBuffer, IngestError> {
    let spec = reader.spec();
    let n_channels = spec.channels as usize;
    if n_channels < 4 {
        return Err(IngestError::InsufficientChannels { found: n_channels });
    }

    let samples: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    Ok(AudioBuffer::from_interleaved(
        &samples,
        n_channels,
        spec.sample_rate,
    )?)
}
