//! Slices an [AudioBuffer] into overlapping, Hann-windowed analysis frames.

use crate::audio_buffer::{AudioBuffer, Channel, B_FORMAT_CHANNELS};
use crate::config::ConfigError;

/// Symmetric Hann window, `w[n] = 0.5 - 0.5 cos(2πn / (len - 1))`.
pub fn hann_window(len: usize) -> Vec<f64> {
    if len < 2 {
        return vec![1.0; len];
    }
    apodize::hanning_iter(len).collect()
}

/// One windowed slice of all four channels.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Position of the frame in the recording, counted in hops
    pub index: usize,
    /// Offset of the first sample of the frame
    pub start: usize,
    channels: [Vec<f64>; B_FORMAT_CHANNELS],
}

impl Frame {
    /// Wraps already windowed channel data.
    pub fn from_channels(index: usize, start: usize, channels: [Vec<f64>; B_FORMAT_CHANNELS]) -> Self {
        Self {
            index,
            start,
            channels,
        }
    }

    /// Windowed samples of one channel.
    pub fn channel(&self, channel: Channel) -> &[f64] {
        &self.channels[channel.index()]
    }

    /// Number of samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// True for a zero-length frame.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Knows the frame geometry and holds the precomputed window.
#[derive(Debug, Clone)]
pub struct Framer {
    frame_size: usize,
    hop_size: usize,
    window: Vec<f64>,
}

impl Framer {
    /// Creates a framer for the given geometry. Fails unless
    /// `frame_size > hop_size > 0`.
    pub fn new(frame_size: usize, hop_size: usize) -> Result<Self, ConfigError> {
        if hop_size == 0 || frame_size <= hop_size {
            return Err(ConfigError::Invalid(format!(
                "frame_size ({}) must exceed hop_size ({}) which must be positive",
                frame_size, hop_size
            )));
        }
        Ok(Self {
            frame_size,
            hop_size,
            window: hann_window(frame_size),
        })
    }

    /// Analysis window length in samples.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Advance between consecutive frames in samples.
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// How many frames a recording of `len` samples yields. Recordings
    /// shorter than a single frame yield none.
    pub fn num_frames(&self, len: usize) -> usize {
        len.saturating_sub(self.frame_size) / self.hop_size
    }

    /// Cuts and windows frame number `index`, or `None` when the frame
    /// would run past the end of the buffer.
    pub fn frame(&self, buffer: &AudioBuffer, index: usize) -> Option<Frame> {
        let start = index.checked_mul(self.hop_size)?;
        let end = start.checked_add(self.frame_size)?;
        if end > buffer.len() {
            return None;
        }

        let channels = Channel::ALL.map(|c| {
            buffer.channel(c)[start..end]
                .iter()
                .zip(&self.window)
                .map(|(s, w)| s * w)
                .collect()
        });

        Some(Frame::from_channels(index, start, channels))
    }

    /// Lazily walks every frame of the buffer, front to back.
    pub fn frames<'a>(&'a self, buffer: &'a AudioBuffer) -> Frames<'a> {
        Frames {
            framer: self,
            buffer,
            next: 0,
            total: self.num_frames(buffer.len()),
        }
    }
}

/// Forward-only iterator over the frames of one buffer.
pub struct Frames<'a> {
    framer: &'a Framer,
    buffer: &'a AudioBuffer,
    next: usize,
    total: usize,
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let frame = self.framer.frame(self.buffer, self.next)?;
        self.next += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Frames<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_buffer(len: usize) -> AudioBuffer {
        let ramp: Vec<f64> = (0..len).map(|v| v as f64).collect();
        AudioBuffer::from_channels(
            [ramp.clone(), ramp.clone(), ramp.clone(), ramp],
            48000,
        )
        .unwrap()
    }

    #[test]
    fn hann_is_symmetric_and_zero_at_edges() {
        let w = hann_window(9);
        assert!(w[0].abs() < 1e-12);
        assert!(w[8].abs() < 1e-12);
        assert!((w[4] - 1.0).abs() < 1e-12);
        for n in 0..9 {
            assert!((w[n] - w[8 - n]).abs() < 1e-12);
        }
    }

    #[test]
    fn frame_count_uses_floor_division() {
        let framer = Framer::new(1024, 512).unwrap();
        assert_eq!(framer.num_frames(0), 0);
        assert_eq!(framer.num_frames(1023), 0);
        assert_eq!(framer.num_frames(1024), 0);
        assert_eq!(framer.num_frames(1536), 1);
        assert_eq!(framer.num_frames(44100), 84);
    }

    #[test]
    fn short_buffer_yields_no_frames() {
        let framer = Framer::new(16, 8).unwrap();
        let buf = ramp_buffer(10);
        assert_eq!(framer.frames(&buf).count(), 0);
    }

    #[test]
    fn frames_advance_by_hop_and_are_windowed() {
        let framer = Framer::new(8, 4).unwrap();
        let buf = ramp_buffer(20);
        let frames: Vec<Frame> = framer.frames(&buf).collect();
        let window = hann_window(8);

        assert_eq!(frames.len(), 3);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index, i);
            assert_eq!(frame.start, i * 4);
            assert_eq!(frame.len(), 8);
            for c in Channel::ALL {
                for (n, s) in frame.channel(c).iter().enumerate() {
                    let expected = (i * 4 + n) as f64 * window[n];
                    assert!((s - expected).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn hop_must_be_smaller_than_frame() {
        assert!(Framer::new(512, 512).is_err());
        assert!(Framer::new(512, 0).is_err());
    }

    #[test]
    fn frame_past_the_end_is_none() {
        let framer = Framer::new(8, 4).unwrap();
        let buf = ramp_buffer(20);
        assert!(framer.frame(&buf, 3).is_some());
        assert!(framer.frame(&buf, 4).is_none());
        assert!(framer.frame(&buf, usize::MAX).is_none());
    }

    #[test]
    fn window_matches_the_closed_form() {
        let w = hann_window(64);
        for (n, v) in w.iter().enumerate() {
            let expected = 0.5 - 0.5 * (2.0 * std::f64::consts::PI * n as f64 / 63.0).cos();
            assert!((v - expected).abs() < 1e-12);
        }
        assert_eq!(hann_window(1), vec![1.0]);
        assert!(hann_window(0).is_empty());
    }
}
