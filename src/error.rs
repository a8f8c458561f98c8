use crate::float::Precision;
use thiserror::Error;

/// Reasons a tree build can be rejected. A failed build never yields a tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("input point set is empty")]
    EmptyInput,

    #[error("dimensionality must be at least 1")]
    ZeroDimension,

    #[error("coordinate buffer of length {len} is not a multiple of dimensionality {dim}")]
    RaggedInput { len: usize, dim: usize },

    #[error("leafsize must be positive")]
    InvalidLeafSize,

    #[error("point {point} has a non-finite coordinate on axis {axis}")]
    NonFiniteCoordinate { point: usize, axis: usize },

    #[error("periodic box has {found} periods but the points have {expected} axes")]
    PeriodicDimensionMismatch { expected: usize, found: usize },

    #[error("period {period} on axis {axis} must be positive and finite")]
    InvalidPeriod { axis: usize, period: f64 },

    #[error("points use {points} coordinates but the periodic box uses {periods}")]
    PrecisionMismatch { points: Precision, periods: Precision },

    #[error("point {point} lies outside the periodic box on axis {axis}")]
    OutsidePeriodicBox { point: usize, axis: usize },

    #[error("failed to create worker pool: {0}")]
    ThreadPool(String),
}

/// Reasons a query can be rejected. A failed query never yields a partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("k must be positive")]
    ZeroK,

    #[error("requested {k} neighbors but the index holds only {len} points")]
    KTooLarge { k: usize, len: usize },

    #[error("query point has {found} coordinates but the index has {expected} axes")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("query buffer of length {len} is not a multiple of dimensionality {dim}")]
    RaggedQuery { len: usize, dim: usize },

    #[error("query point has a non-finite coordinate on axis {axis}")]
    NonFiniteQuery { axis: usize },

    #[error("index was built with {index} coordinates but the query uses {query}")]
    PrecisionMismatch { index: Precision, query: Precision },

    #[error("decomposition axis {axis} is out of range for {dim} axes")]
    AxisOutOfRange { axis: usize, dim: usize },
}
