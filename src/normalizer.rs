//! Peak normalization of a B-format recording.
//!
//! Integer PCM decoders and some float files hand us samples outside of
//! [-1, 1]. Before analysis the whole buffer is scaled by a single common
//! factor so that the loudest sample of any channel lands on 1.0. Using one
//! factor for all four channels keeps the X/W, Y/W and Z/W ratios intact.

use crate::audio_buffer::AudioBuffer;

/// Largest absolute sample value across all four channels. NaN samples are
/// ignored.
pub fn peak(buffer: &AudioBuffer) -> f64 {
    buffer
        .channels()
        .iter()
        .flatten()
        .fold(0.0, |acc: f64, s| acc.max(s.abs()))
}

/// Scales the buffer in place when its peak exceeds 1.0.
///
/// Returns the peak that was divided out, or `None` when the buffer was
/// already within bounds (including an all-zero buffer) and left untouched.
pub fn normalize(buffer: &mut AudioBuffer) -> Option<f64> {
    let peak = peak(buffer);
    if peak <= 1.0 {
        return None;
    }

    for sample in buffer.channels_mut().iter_mut().flatten() {
        *sample /= peak;
    }
    Some(peak)
}
