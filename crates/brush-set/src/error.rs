//! Error types for brush geometry operations.

use thiserror::Error;

/// Errors that can occur while building, normalizing or cutting brushes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrushError {
    /// A polygon has fewer than 3 non-collinear vertices, so no plane can be derived.
    #[error("Polygon {polygon} has fewer than 3 non-collinear vertices")]
    DegeneratePolygon {
        /// Index of the offending polygon.
        polygon: usize,
    },

    /// Half-edge bookkeeping is inconsistent (bad twin, dangling index, open edge).
    #[error("Invalid half-edge topology: {reason}")]
    InvalidTopology {
        /// What was found to be inconsistent.
        reason: String,
    },

    /// A brush generator reported failure.
    #[error("Brush generation failed: {reason}")]
    GenerationFailed {
        /// Why the generator gave up.
        reason: String,
    },

    /// The mesh lies entirely on the discarded side of a cutting plane.
    #[error("Mesh lies entirely on the discarded side of the cutting plane")]
    EmptyAfterCut,
}

impl BrushError {
    pub(crate) fn topology(reason: impl Into<String>) -> Self {
        Self::InvalidTopology {
            reason: reason.into(),
        }
    }

    pub(crate) fn generation(reason: impl Into<String>) -> Self {
        Self::GenerationFailed {
            reason: reason.into(),
        }
    }
}

/// Result type for brush operations.
pub type BrushResult<T> = std::result::Result<T, BrushError>;
