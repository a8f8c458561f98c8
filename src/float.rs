use num_traits::Float;
use std::fmt::Debug;

/// Runtime tag for the two supported coordinate widths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Precision {
    F32,
    F64,
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precision::F32 => write!(f, "f32"),
            Precision::F64 => write!(f, "f64"),
        }
    }
}

/// Scalar type of the coordinates stored in a [`crate::KdTree`].
///
/// Implemented for `f32` and `f64` only. The precision is fixed for the
/// lifetime of a tree.
pub trait Coord: Float + Debug + Default + Send + Sync + 'static {
    const PRECISION: Precision;
}

impl Coord for f32 {
    const PRECISION: Precision = Precision::F32;
}

impl Coord for f64 {
    const PRECISION: Precision = Precision::F64;
}
