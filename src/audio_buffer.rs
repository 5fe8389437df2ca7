//! The four-channel sample store that every analysis stage reads from.
//!
//! An [AudioBuffer] always holds exactly the W, X, Y and Z channels of a
//! first-order Ambisonic recording, de-interleaved and of equal length.

use std::{borrow::Cow, fmt};

/// Number of channels in first-order B-format.
pub const B_FORMAT_CHANNELS: usize = 4;

/// One of the four B-format channels, in the order they appear in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Omnidirectional pressure component
    W,
    /// Front-back figure-of-eight
    X,
    /// Left-right figure-of-eight
    Y,
    /// Up-down figure-of-eight
    Z,
}

impl Channel {
    /// All channels in file order.
    pub const ALL: [Channel; B_FORMAT_CHANNELS] = [Channel::W, Channel::X, Channel::Y, Channel::Z];

    /// Position of the channel in an interleaved sample frame.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Things that can go wrong while assembling an [AudioBuffer].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// The source has fewer than the four channels B-format needs.
    TooFewChannels {
        /// How many channels the source actually had
        found: usize,
    },

    /// The four channel vectors handed over had different lengths.
    UnequalChannelLengths,

    /// A sample rate of zero makes frame timing meaningless.
    ZeroSampleRate,
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            BufferError::TooFewChannels { found } => Cow::from(format!(
                "expected at least {} channels but got {}",
                B_FORMAT_CHANNELS, found
            )),
            BufferError::UnequalChannelLengths => Cow::from("unequal channel lengths"),
            BufferError::ZeroSampleRate => Cow::from("sample rate must be positive"),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for BufferError {}

/// De-interleaved W, X, Y, Z samples plus their sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: [Vec<f64>; B_FORMAT_CHANNELS],
    sample_rate: u32,
}

impl AudioBuffer {
    /// Builds a buffer from four already separated channels.
    pub fn from_channels(
        channels: [Vec<f64>; B_FORMAT_CHANNELS],
        sample_rate: u32,
    ) -> Result<Self, BufferError> {
        if sample_rate == 0 {
            return Err(BufferError::ZeroSampleRate);
        }
        let len = channels[0].len();
        if channels.iter().any(|c| c.len() != len) {
            return Err(BufferError::UnequalChannelLengths);
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Builds a buffer from interleaved samples with `n_channels` channels
    /// per sample frame. Channels 0 through 3 become W, X, Y and Z; any
    /// further channels are dropped, as is a trailing partial sample frame.
    pub fn from_interleaved(
        samples: &[f64],
        n_channels: usize,
        sample_rate: u32,
    ) -> Result<Self, BufferError> {
        if n_channels < B_FORMAT_CHANNELS {
            return Err(BufferError::TooFewChannels { found: n_channels });
        }

        let n_frames = samples.len() / n_channels;
        let mut channels: [Vec<f64>; B_FORMAT_CHANNELS] =
            std::array::from_fn(|_| Vec::with_capacity(n_frames));

        for sample_frame in samples.chunks_exact(n_channels) {
            for (channel, &sample) in channels.iter_mut().zip(sample_frame) {
                channel.push(sample);
            }
        }

        Self::from_channels(channels, sample_rate)
    }

    /// Number of samples in each channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// True when the recording holds no samples at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length of the recording in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// The samples of a single channel.
    pub fn channel(&self, channel: Channel) -> &[f64] {
        &self.channels[channel.index()]
    }

    /// All four channels, W first.
    pub fn channels(&self) -> &[Vec<f64>; B_FORMAT_CHANNELS] {
        &self.channels
    }

    pub(crate) fn channels_mut(&mut self) -> &mut [Vec<f64>; B_FORMAT_CHANNELS] {
        &mut self.channels
    }

    /// Re-interleaves the channels as `f32`s, W X Y Z W X Y Z ...
    pub fn interleaved(&self) -> Vec<f32> {
        (0..self.len())
            .flat_map(|i| self.channels.iter().map(move |c| c[i] as f32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deinterleaves_first_four_channels() {
        // 5 channels, the last one should be thrown away
        let samples: Vec<f64> = (0..15).map(|v| v as f64).collect();
        let buf = AudioBuffer::from_interleaved(&samples, 5, 48000).unwrap();

        assert_eq!(buf.len(), 3);
        assert_eq!(buf.channel(Channel::W), &[0.0, 5.0, 10.0]);
        assert_eq!(buf.channel(Channel::X), &[1.0, 6.0, 11.0]);
        assert_eq!(buf.channel(Channel::Y), &[2.0, 7.0, 12.0]);
        assert_eq!(buf.channel(Channel::Z), &[3.0, 8.0, 13.0]);
    }

    #[test]
    fn drops_partial_trailing_frame() {
        let samples = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let buf = AudioBuffer::from_interleaved(&samples, 4, 8000).unwrap();
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn rejects_three_channels() {
        let samples = [0.0; 9];
        assert_eq!(
            AudioBuffer::from_interleaved(&samples, 3, 44100),
            Err(BufferError::TooFewChannels { found: 3 })
        );
    }

    #[test]
    fn rejects_unequal_lengths_and_zero_rate() {
        let channels = [vec![0.0; 4], vec![0.0; 4], vec![0.0; 3], vec![0.0; 4]];
        assert_eq!(
            AudioBuffer::from_channels(channels, 44100),
            Err(BufferError::UnequalChannelLengths)
        );

        let channels = [vec![0.0; 4], vec![0.0; 4], vec![0.0; 4], vec![0.0; 4]];
        assert_eq!(
            AudioBuffer::from_channels(channels, 0),
            Err(BufferError::ZeroSampleRate)
        );
    }

    #[test]
    fn interleave_is_inverse_of_deinterleave() {
        let samples: Vec<f64> = (0..12).map(|v| v as f64 * 0.125).collect();
        let buf = AudioBuffer::from_interleaved(&samples, 4, 44100).unwrap();
        let back: Vec<f64> = buf.interleaved().into_iter().map(f64::from).collect();
        assert_eq!(back, samples);
    }
}
