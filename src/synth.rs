//! Synthetic first-order B-format recordings.
//!
//! Handy for trying the analyzer without an Ambisonic microphone: a plane
//! wave from a known direction is encoded into W, X, Y and Z, optionally
//! buried in uniform noise, and written out as a 4-channel float WAV.

use crate::audio_buffer::{AudioBuffer, BufferError};
use hound::{SampleFormat, WavSpec, WavWriter};
use rand::prelude::*;
use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::path::Path;

/// A sinusoidal plane wave arriving from a fixed direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneWave {
    /// Radians, counter-clockwise from +x (front) towards +y (left)
    pub azimuth: f64,
    /// Radians above the horizontal plane
    pub elevation: f64,
    /// Hz
    pub frequency: f64,
    /// Peak amplitude of the source signal
    pub amplitude: f64,
}

impl PlaneWave {
    /// Builds a plane wave with the angles given in degrees.
    pub fn from_degrees(azimuth: f64, elevation: f64, frequency: f64, amplitude: f64) -> Self {
        Self {
            azimuth: azimuth.to_radians(),
            elevation: elevation.to_radians(),
            frequency,
            amplitude,
        }
    }

    /// Unit vector pointing at the source.
    pub fn direction(&self) -> [f64; 3] {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        [cos_az * cos_el, sin_az * cos_el, sin_el]
    }

    /// W, X, Y and Z gains, with W at -3 dB as in traditional B-format.
    pub fn gains(&self) -> [f64; 4] {
        let [x, y, z] = self.direction();
        [FRAC_1_SQRT_2, x, y, z]
    }

    /// The source signal at sample `n`.
    pub fn sample(&self, n: usize, sample_rate: u32) -> f64 {
        let t = n as f64 / sample_rate as f64;
        self.amplitude * (2.0 * PI * self.frequency * t).cos()
    }
}

/// Mixes `sources` into a B-format buffer of `len` samples. When `noise` is
/// positive every sample of every channel gets independent uniform noise in
/// `(-noise, noise)`. Fails only for a zero sample rate.
pub fn render(
    sources: &[PlaneWave],
    sample_rate: u32,
    len: usize,
    noise: f64,
) -> Result<AudioBuffer, BufferError> {
    let mut channels: [Vec<f64>; 4] = std::array::from_fn(|_| vec![0.0; len]);

    for source in sources {
        let gains = source.gains();
        for n in 0..len {
            let s = source.sample(n, sample_rate);
            for (channel, gain) in channels.iter_mut().zip(gains) {
                channel[n] += gain * s;
            }
        }
    }

    if noise > 0.0 {
        let mut rng = thread_rng();
        for sample in channels.iter_mut().flatten() {
            *sample += rng.gen_range(-noise..noise);
        }
    }

    AudioBuffer::from_channels(channels, sample_rate)
}

/// Writes the buffer as a 4-channel 32-bit float WAV.
pub fn write_wav(buffer: &AudioBuffer, path: impl AsRef<Path>) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 4,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for sample in buffer.interleaved() {
        writer.write_sample(sample)?;
    }
    writer.finalize()
}
