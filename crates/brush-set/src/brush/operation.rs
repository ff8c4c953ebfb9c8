//! Operation tags telling the boolean evaluator how a brush combines.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a brush combines with the brushes before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CsgOperation {
    /// Adds the brush volume.
    #[default]
    Additive,
    /// Carves the brush volume out of what came before.
    Subtractive,
    /// Keeps only what overlaps the brush volume.
    Intersecting,
}
