//! Per-frame analysis: spectrum, direction estimates, ranking.

use crate::component::{Component, ComponentError};
use crate::config::AnalysisConfig;
use crate::estimator::{estimate_directions, EstimatorSettings, RejectionTally};
use crate::framer::Frame;
use crate::ranker::RankedTopK;
use crate::spectral::SpectralTransform;

use log::{trace, warn};
use std::fmt;

/// The result of analyzing one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedFrame {
    /// Frame index in the recording
    pub index: usize,
    /// The loudest directions, ready to send
    pub ranked: RankedTopK,
    /// Bins that were discarded
    pub rejected: RejectionTally,
}

/// Spectral transform, estimator and ranker bundled into one stage.
pub struct FrameAnalyzer {
    transform: SpectralTransform,
    settings: EstimatorSettings,
    num_points: usize,
    transform_failures: usize,
}

impl FrameAnalyzer {
    /// Builds an analyzer for an already validated configuration.
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            transform: SpectralTransform::new(config.frame_size),
            settings: config.estimator_settings(),
            num_points: config.num_points,
            transform_failures: 0,
        }
    }

    /// Analyzes one frame. A frame the transform cannot handle is logged
    /// and comes back with no points.
    pub fn analyze(&mut self, frame: &Frame) -> AnalyzedFrame {
        let spectrum = match self.transform.transform(frame) {
            Ok(spectrum) => spectrum,
            Err(error) => {
                warn!("frame {} : spectral transform failed : {}", frame.index, error);
                self.transform_failures += 1;
                return AnalyzedFrame {
                    index: frame.index,
                    ranked: RankedTopK::default(),
                    rejected: RejectionTally::default(),
                };
            }
        };

        let found = estimate_directions(&spectrum, &self.settings);
        trace!(
            "frame {} : {} estimates, rejected {:?}",
            frame.index,
            found.estimates.len(),
            found.rejected
        );

        AnalyzedFrame {
            index: frame.index,
            ranked: RankedTopK::rank(found.estimates, self.num_points),
            rejected: found.rejected,
        }
    }
}

impl Component for FrameAnalyzer {
    type InData = Frame;
    type OutData = AnalyzedFrame;

    fn convert(&mut self, input: Frame) -> AnalyzedFrame {
        self.analyze(&input)
    }

    fn finalize(&mut self) -> Result<(), ComponentError> {
        match self.transform_failures {
            0 => Ok(()),
            n => Err(ComponentError::TransformFailures(n)),
        }
    }
}

impl fmt::Display for FrameAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameAnalyzer")
    }
}
