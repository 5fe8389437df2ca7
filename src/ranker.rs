//! Orders a frame's direction estimates by energy and keeps the loudest.

use crate::estimator::DirectionEstimate;

/// At most `num_points` estimates of one frame, loudest first. Estimates of
/// equal energy keep their bin order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedTopK {
    estimates: Vec<DirectionEstimate>,
}

impl RankedTopK {
    /// Sorts by descending energy (stable) and truncates to `num_points`.
    pub fn rank(mut estimates: Vec<DirectionEstimate>, num_points: usize) -> Self {
        estimates.sort_by(|a, b| b.energy.total_cmp(&a.energy));
        estimates.truncate(num_points);
        Self { estimates }
    }

    /// True when the frame had nothing worth sending.
    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    /// Number of ranked estimates.
    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    /// The loudest estimate, if any.
    pub fn loudest(&self) -> Option<&DirectionEstimate> {
        self.estimates.first()
    }

    /// Estimates in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, DirectionEstimate> {
        self.estimates.iter()
    }
}

impl<'a> IntoIterator for &'a RankedTopK {
    type Item = &'a DirectionEstimate;
    type IntoIter = std::slice::Iter<'a, DirectionEstimate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
