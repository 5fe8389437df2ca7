//! One-sided DFT of the four channels of a windowed frame.
//!
//! The transform is unnormalized (the `realfft` convention), applied the same
//! way to every channel and every frame, so energies are comparable across
//! a whole run.

use std::sync::Arc;

use crate::audio_buffer::{Channel, B_FORMAT_CHANNELS};
use crate::framer::Frame;
use realfft::{num_complex::Complex, FftError, RealFftPlanner, RealToComplex};

/// Complex spectra of the four channels of one frame, bins `0..=N/2`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralFrame {
    /// Index of the frame this spectrum came from
    pub index: usize,
    channels: [Vec<Complex<f64>>; B_FORMAT_CHANNELS],
}

impl SpectralFrame {
    /// Wraps four spectra of equal length.
    ///
    /// # Panics
    ///
    /// Panics if the spectra differ in length.
    pub(crate) fn from_channels(index: usize, channels: [Vec<Complex<f64>>; B_FORMAT_CHANNELS]) -> Self {
        let len = channels[0].len();
        assert!(
            channels.iter().all(|c| c.len() == len),
            "spectra must have equal length"
        );
        Self { index, channels }
    }

    /// Spectrum of one channel.
    pub fn channel(&self, channel: Channel) -> &[Complex<f64>] {
        &self.channels[channel.index()]
    }

    /// Number of bins, DC and Nyquist included.
    pub fn num_bins(&self) -> usize {
        self.channels[0].len()
    }

    /// The W, X, Y, Z coefficients of one bin, if the spectrum has it.
    pub fn bin(&self, bin: usize) -> Option<[Complex<f64>; B_FORMAT_CHANNELS]> {
        if bin >= self.num_bins() {
            return None;
        }
        Some(Channel::ALL.map(|c| self.channels[c.index()][bin]))
    }
}

/// A planned real-to-complex FFT plus its scratch space, reused across frames.
pub struct SpectralTransform {
    fft: Arc<dyn RealToComplex<f64>>,
    input: Vec<f64>,
    scratch: Vec<Complex<f64>>,
}

impl SpectralTransform {
    /// Plans a forward transform for frames of `frame_size` samples.
    pub fn new(frame_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(frame_size);
        let input = fft.make_input_vec();
        let scratch = fft.make_scratch_vec();

        Self {
            fft,
            input,
            scratch,
        }
    }

    /// Frame length the transform was planned for.
    pub fn frame_size(&self) -> usize {
        self.fft.len()
    }

    /// Number of output bins, `frame_size / 2 + 1`.
    pub fn num_bins(&self) -> usize {
        self.fft.complex_len()
    }

    /// Transforms every channel of `frame`. Fails only when the frame length
    /// does not match the planned length.
    pub fn transform(&mut self, frame: &Frame) -> Result<SpectralFrame, FftError> {
        let mut spectra: [Vec<Complex<f64>>; B_FORMAT_CHANNELS] = Default::default();

        for c in Channel::ALL {
            let samples = frame.channel(c);
            if samples.len() != self.input.len() {
                return Err(FftError::InputBuffer(self.input.len(), samples.len()));
            }
            // realfft uses the input as scratch, so work on a copy
            self.input.copy_from_slice(samples);

            let mut output = self.fft.make_output_vec();
            self.fft
                .process_with_scratch(&mut self.input, &mut output, &mut self.scratch)?;
            spectra[c.index()] = output;
        }

        Ok(SpectralFrame::from_channels(frame.index, spectra))
    }
}
