//! Error types for tree construction and queries.

use thiserror::Error;

/// Precondition violations reported by [`crate::TreeBuilder`] and the query functions.
///
/// Every variant is raised before any work starts, so a failed call never leaves
/// a partially built tree behind. Asking for more neighbours than there are points
/// is not an error: the missing slots are padded instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KdTreeError {
    /// Points must have at least one coordinate.
    #[error("dimensionality must be at least 1")]
    ZeroDimensions,

    /// The flat coordinate buffer does not split into whole points.
    #[error("coordinate buffer of length {len} is not a multiple of {dims} dimensions")]
    RaggedCoordinates { len: usize, dims: usize },

    /// A data point has a NaN or infinite coordinate.
    #[error("non-finite coordinate in point {point} on axis {axis}")]
    NonFiniteCoordinate { point: usize, axis: usize },

    /// The periodic lengths do not provide one entry per axis.
    #[error("expected {expected} periodic lengths, got {got}")]
    PeriodicLengthMismatch { expected: usize, got: usize },

    /// A periodic length is negative or not finite.
    #[error("invalid periodic length {value} on axis {axis}")]
    InvalidPeriod { axis: usize, value: f64 },

    #[error("leafsize must be at least 1")]
    ZeroLeafSize,

    /// Query points have a different dimensionality than the tree.
    #[error("query points have {got} dimensions, tree has {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A query point has a NaN or infinite coordinate.
    #[error("non-finite coordinate in query {query} on axis {axis}")]
    NonFiniteQuery { query: usize, axis: usize },

    #[error("number of neighbours k must be at least 1")]
    ZeroNeighbors,

    #[error("eps must be finite and non-negative, got {0}")]
    InvalidEpsilon(f64),

    #[error("distance upper bound must be non-negative, got {0}")]
    InvalidUpperBound(f64),

    #[error("chunk size must be at least 1")]
    ZeroChunkSize,

    #[error("thread count must be at least 1")]
    ZeroThreads,
}

/// Result type for tree operations.
pub type Result<T> = std::result::Result<T, KdTreeError>;
