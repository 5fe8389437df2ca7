//! Per-bin direction-of-arrival estimation.
//!
//! For a single far-field plane wave, first-order B-format encodes the
//! source direction into the X, Y and Z channels as the direction cosines
//! times the signal carried by W. Dividing the real part of each
//! directional coefficient by the real part of W cancels the source signal
//! and leaves a vector parallel to the direction of arrival, which is then
//! scaled to unit length.
//!
//! Only the real parts take part in the ratio and the phase is ignored, so
//! this is a coarse estimate. It is exact for bins dominated by one source
//! and degrades when several sources share a bin. The energy of a bin is
//! the magnitude of its W coefficient.
//!
//! A bin is dropped, without error, when any of the following holds:
//!
//! - its W magnitude is below `energy_threshold`
//! - `|Re(W)|` is below `epsilon`, where the ratios blow up
//! - a ratio comes out NaN
//! - the raw vector is shorter than `epsilon`
//! - anything non-finite survives normalization

use crate::spectral::SpectralFrame;
use realfft::num_complex::Complex;

/// Default minimum W magnitude for a bin to be considered.
pub const DEFAULT_ENERGY_THRESHOLD: f64 = 0.01;

/// Default guard against near-zero denominators and vectors.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// A unit direction of arrival plus the energy of the bin it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionEstimate {
    /// Frequency bin the estimate was taken from
    pub bin: usize,
    /// Unit vector x component
    pub x: f64,
    /// Unit vector y component
    pub y: f64,
    /// Unit vector z component
    pub z: f64,
    /// Magnitude of the W coefficient
    pub energy: f64,
}

impl DirectionEstimate {
    /// Euclidean length of the direction, 1 within rounding.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Gate thresholds for [estimate_bin].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorSettings {
    /// Bins with `|W|` below this are ignored
    pub energy_threshold: f64,
    /// Smallest acceptable `|Re(W)|` and raw vector length
    pub epsilon: f64,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            energy_threshold: DEFAULT_ENERGY_THRESHOLD,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

/// Why a bin did not produce a [DirectionEstimate].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinRejection {
    /// `|W|` under the energy threshold
    LowEnergy,
    /// `|Re(W)|` too close to zero to divide by
    UnstableReference,
    /// One of the ratios was NaN
    NotANumber,
    /// The raw direction vector had (almost) no length
    Degenerate,
    /// An infinity made it through to the normalized estimate
    NonFinite,
}

/// Per-frame counts of rejected bins, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionTally {
    /// See [BinRejection::LowEnergy]
    pub low_energy: usize,
    /// See [BinRejection::UnstableReference]
    pub unstable_reference: usize,
    /// See [BinRejection::NotANumber]
    pub not_a_number: usize,
    /// See [BinRejection::Degenerate]
    pub degenerate: usize,
    /// See [BinRejection::NonFinite]
    pub non_finite: usize,
}

impl RejectionTally {
    /// Counts one rejection.
    pub fn record(&mut self, reason: BinRejection) {
        match reason {
            BinRejection::LowEnergy => self.low_energy += 1,
            BinRejection::UnstableReference => self.unstable_reference += 1,
            BinRejection::NotANumber => self.not_a_number += 1,
            BinRejection::Degenerate => self.degenerate += 1,
            BinRejection::NonFinite => self.non_finite += 1,
        }
    }

    /// Total number of rejected bins.
    pub fn total(&self) -> usize {
        self.low_energy + self.unstable_reference + self.not_a_number + self.degenerate + self.non_finite
    }
}

/// Everything the estimator found in one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameEstimates {
    /// Surviving estimates in increasing bin order
    pub estimates: Vec<DirectionEstimate>,
    /// Bins that were dropped, and why
    pub rejected: RejectionTally,
}

/// Estimates the direction carried by a single bin.
pub fn estimate_bin(
    bin: usize,
    [w, x, y, z]: [Complex<f64>; 4],
    settings: &EstimatorSettings,
) -> Result<DirectionEstimate, BinRejection> {
    let energy = w.norm();
    if energy < settings.energy_threshold {
        return Err(BinRejection::LowEnergy);
    }
    if w.re.abs() < settings.epsilon {
        return Err(BinRejection::UnstableReference);
    }

    let x_dir = x.re / w.re;
    let y_dir = y.re / w.re;
    let z_dir = z.re / w.re;
    if x_dir.is_nan() || y_dir.is_nan() || z_dir.is_nan() {
        return Err(BinRejection::NotANumber);
    }

    let length = (x_dir * x_dir + y_dir * y_dir + z_dir * z_dir).sqrt();
    if length < settings.epsilon {
        return Err(BinRejection::Degenerate);
    }

    let estimate = DirectionEstimate {
        bin,
        x: x_dir / length,
        y: y_dir / length,
        z: z_dir / length,
        energy,
    };
    if [estimate.x, estimate.y, estimate.z, estimate.energy]
        .iter()
        .all(|v| v.is_finite())
    {
        Ok(estimate)
    } else {
        Err(BinRejection::NonFinite)
    }
}

/// Runs [estimate_bin] over every bin of the frame except DC and Nyquist.
pub fn estimate_directions(frame: &SpectralFrame, settings: &EstimatorSettings) -> FrameEstimates {
    let mut found = FrameEstimates::default();
    let last = frame.num_bins().saturating_sub(1);

    for (bin, coeffs) in (1..last).filter_map(|b| frame.bin(b).map(|c| (b, c))) {
        match estimate_bin(bin, coeffs, settings) {
            Ok(estimate) => found.estimates.push(estimate),
            Err(reason) => found.rejected.record(reason),
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex<f64> {
        Complex::new(re, im)
    }

    fn zeros(n: usize) -> Vec<Complex<f64>> {
        vec![c(0.0, 0.0); n]
    }

    #[test]
    fn single_source_on_x_axis() {
        let settings = EstimatorSettings::default();
        let est = estimate_bin(
            3,
            [c(1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)],
            &settings,
        )
        .unwrap();

        assert_eq!(
            est,
            DirectionEstimate {
                bin: 3,
                x: 1.0,
                y: 0.0,
                z: 0.0,
                energy: 1.0
            }
        );
    }

    #[test]
    fn ratio_is_normalized_and_sign_follows_w() {
        let settings = EstimatorSettings::default();
        // a negative Re(W) flips the sign of every ratio; imaginary parts are ignored
        let est = estimate_bin(
            1,
            [c(-2.0, 0.5), c(2.0, 9.0), c(-2.0, 0.0), c(4.0, -1.0)],
            &settings,
        )
        .unwrap();

        let len = (1.0f64 + 1.0 + 4.0).sqrt();
        assert!((est.x - (-1.0 / len)).abs() < 1e-12);
        assert!((est.y - (1.0 / len)).abs() < 1e-12);
        assert!((est.z - (-2.0 / len)).abs() < 1e-12);
        assert!((est.norm() - 1.0).abs() < 1e-12);
        assert!((est.energy - c(-2.0, 0.5).norm()).abs() < 1e-12);
    }

    #[test]
    fn gates_reject_in_order() {
        let s = EstimatorSettings::default();
        let one = c(1.0, 0.0);

        assert_eq!(
            estimate_bin(1, [c(0.001, 0.0), one, one, one], &s),
            Err(BinRejection::LowEnergy)
        );
        // plenty of energy, all of it imaginary
        assert_eq!(
            estimate_bin(1, [c(1e-9, 5.0), one, one, one], &s),
            Err(BinRejection::UnstableReference)
        );
        assert_eq!(
            estimate_bin(1, [one, c(f64::NAN, 0.0), one, one], &s),
            Err(BinRejection::NotANumber)
        );
        assert_eq!(
            estimate_bin(1, [one, c(0.0, 3.0), c(1e-8, 0.0), c(0.0, 0.0)], &s),
            Err(BinRejection::Degenerate)
        );
        assert_eq!(
            estimate_bin(1, [one, c(f64::INFINITY, 0.0), one, one], &s),
            Err(BinRejection::NonFinite)
        );
    }

    #[test]
    fn nan_energy_never_survives() {
        let s = EstimatorSettings::default();
        let nan = c(f64::NAN, f64::NAN);
        assert!(estimate_bin(1, [nan, nan, nan, nan], &s).is_err());
    }

    #[test]
    fn silent_frame_yields_nothing() {
        let frame = SpectralFrame::from_channels(0, [zeros(513), zeros(513), zeros(513), zeros(513)]);
        let found = estimate_directions(&frame, &EstimatorSettings::default());

        assert!(found.estimates.is_empty());
        assert_eq!(found.rejected.low_energy, 511);
        assert_eq!(found.rejected.total(), 511);
    }

    #[test]
    fn dc_and_nyquist_are_skipped() {
        let n = 9;
        let loud = vec![c(1.0, 0.0); n];
        let frame = SpectralFrame::from_channels(0, [loud.clone(), loud.clone(), zeros(n), zeros(n)]);
        let found = estimate_directions(&frame, &EstimatorSettings::default());

        let bins: Vec<usize> = found.estimates.iter().map(|e| e.bin).collect();
        assert_eq!(bins, (1..n - 1).collect::<Vec<_>>());
        assert_eq!(found.rejected.total(), 0);
    }

    #[test]
    fn every_estimate_is_unit_length() {
        let n = 65;
        let w: Vec<_> = (0..n).map(|i| c((i as f64 * 0.37).sin() + 0.05, (i as f64).cos())).collect();
        let x: Vec<_> = (0..n).map(|i| c((i as f64 * 1.3).cos() * 3.0, 0.2)).collect();
        let y: Vec<_> = (0..n).map(|i| c((i as f64 * 0.7).sin() * 1e-3, 0.0)).collect();
        let z: Vec<_> = (0..n).map(|i| c(i as f64 - 30.0, -1.0)).collect();
        let frame = SpectralFrame::from_channels(0, [w, x, y, z]);

        let found = estimate_directions(&frame, &EstimatorSettings::default());
        assert!(!found.estimates.is_empty());
        for est in &found.estimates {
            assert!((est.x * est.x + est.y * est.y + est.z * est.z - 1.0).abs() < 1e-6);
            assert!(est.energy >= 0.01);
        }
        assert_eq!(found.estimates.len() + found.rejected.total(), n - 2);
    }
}
