//! Tolerances and validation settings shared by a brush set.

use crate::plane::PLANE_EPSILON;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters controlling how a [`BrushSet`](crate::BrushSet) normalizes and cuts brushes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BrushParams {
    /// Distance under which a vertex counts as lying on a cutting plane.
    pub plane_epsilon: f32,

    /// Report validation failures of generated brushes to the diagnostic sink.
    pub strict_validation: bool,
}

impl Default for BrushParams {
    fn default() -> Self {
        Self {
            plane_epsilon: PLANE_EPSILON,
            strict_validation: true,
        }
    }
}

impl BrushParams {
    /// Tight tolerance for small-scale, high precision geometry.
    #[must_use]
    pub fn precise() -> Self {
        Self {
            plane_epsilon: 1e-6,
            ..Default::default()
        }
    }

    /// Loose tolerance for large levels with accumulated float error.
    ///
    /// Validation failures are still dropped, just not reported.
    #[must_use]
    pub fn tolerant() -> Self {
        Self {
            plane_epsilon: 1e-3,
            strict_validation: false,
        }
    }

    /// Returns a copy with a different plane epsilon.
    #[must_use]
    pub fn with_plane_epsilon(mut self, epsilon: f32) -> Self {
        self.plane_epsilon = epsilon;
        self
    }
}
