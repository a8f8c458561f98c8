//! Precision-erased build and query entry points.
//!
//! [`KdTree`] fixes its precision at compile time. [`Index`] wraps either
//! precision behind one type so callers holding runtime-typed buffers (the
//! WASM surface, file loaders) can build and query without being generic, with
//! mismatched precisions reported as errors instead of type errors.

use crate::config::BuildConfig;
use crate::error::{BuildError, QueryError};
use crate::float::{Coord, Precision};
use crate::kdtree::KdTree;
use crate::query::{DecomposedNeighbor, NearestNeighbors, Neighbor};

/// A borrowed coordinate buffer of either precision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Coords<'a> {
    F32(&'a [f32]),
    F64(&'a [f64]),
}

impl Coords<'_> {
    pub fn precision(&self) -> Precision {
        match self {
            Coords::F32(_) => Precision::F32,
            Coords::F64(_) => Precision::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Coords::F32(c) => c.len(),
            Coords::F64(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> From<&'a [f32]> for Coords<'a> {
    fn from(c: &'a [f32]) -> Self {
        Coords::F32(c)
    }
}

impl<'a> From<&'a [f64]> for Coords<'a> {
    fn from(c: &'a [f64]) -> Self {
        Coords::F64(c)
    }
}

/// Neighbors of one query point, plain or axis-decomposed.
#[derive(Clone, Debug, PartialEq)]
pub enum Neighbors<T> {
    Plain(Vec<Neighbor<T>>),
    Decomposed(Vec<DecomposedNeighbor<T>>),
}

impl<T> Neighbors<T> {
    pub fn len(&self) -> usize {
        match self {
            Neighbors::Plain(n) => n.len(),
            Neighbors::Decomposed(n) => n.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Original indices in ascending distance order.
    pub fn indices(&self) -> Vec<usize> {
        match self {
            Neighbors::Plain(n) => n.iter().map(|n| n.index).collect(),
            Neighbors::Decomposed(n) => n.iter().map(|n| n.index).collect(),
        }
    }
}

/// [`Neighbors`] in the precision of the index that produced them.
#[derive(Clone, Debug, PartialEq)]
pub enum AnyNeighbors {
    F32(Neighbors<f32>),
    F64(Neighbors<f64>),
}

impl AnyNeighbors {
    pub fn indices(&self) -> Vec<usize> {
        match self {
            AnyNeighbors::F32(n) => n.indices(),
            AnyNeighbors::F64(n) => n.indices(),
        }
    }
}

/// A built tree of either precision.
#[derive(Clone, Debug)]
pub enum Index {
    F32(KdTree<f32>),
    F64(KdTree<f64>),
}

impl Index {
    /// Builds a tree in the precision of `points`. `periods`, when given,
    /// must use the same precision.
    pub fn build(
        points: Coords<'_>,
        dim: usize,
        config: &BuildConfig,
        periods: Option<Coords<'_>>,
    ) -> Result<Self, BuildError> {
        match (points, periods) {
            (Coords::F32(p), None) => Ok(Index::F32(KdTree::build(p, dim, config, None)?)),
            (Coords::F64(p), None) => Ok(Index::F64(KdTree::build(p, dim, config, None)?)),
            (Coords::F32(p), Some(Coords::F32(b))) => Ok(Index::F32(KdTree::build(p, dim, config, Some(b))?)),
            (Coords::F64(p), Some(Coords::F64(b))) => Ok(Index::F64(KdTree::build(p, dim, config, Some(b))?)),
            (points, Some(periods)) => Err(BuildError::PrecisionMismatch {
                points: points.precision(),
                periods: periods.precision(),
            }),
        }
    }

    pub fn precision(&self) -> Precision {
        match self {
            Index::F32(_) => Precision::F32,
            Index::F64(_) => Precision::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Index::F32(t) => t.len(),
            Index::F64(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dim(&self) -> usize {
        match self {
            Index::F32(t) => t.dim(),
            Index::F64(t) => t.dim(),
        }
    }

    /// The `k` nearest neighbors of `point`, decomposed along `decomposed_axis` when given.
    pub fn query(
        &self,
        point: Coords<'_>,
        k: usize,
        decomposed_axis: Option<usize>,
    ) -> Result<AnyNeighbors, QueryError> {
        match (self, point) {
            (Index::F32(t), Coords::F32(p)) => Ok(AnyNeighbors::F32(query_one(t, p, k, decomposed_axis)?)),
            (Index::F64(t), Coords::F64(p)) => Ok(AnyNeighbors::F64(query_one(t, p, k, decomposed_axis)?)),
            (_, point) => Err(self.mismatch(point)),
        }
    }

    /// [`Index::query`] for every point of a flat buffer; results follow input order.
    pub fn query_batch(
        &self,
        points: Coords<'_>,
        k: usize,
        decomposed_axis: Option<usize>,
    ) -> Result<Vec<AnyNeighbors>, QueryError> {
        match (self, points) {
            (Index::F32(t), Coords::F32(p)) => Ok(query_many(t, p, k, decomposed_axis)?
                .into_iter()
                .map(AnyNeighbors::F32)
                .collect()),
            (Index::F64(t), Coords::F64(p)) => Ok(query_many(t, p, k, decomposed_axis)?
                .into_iter()
                .map(AnyNeighbors::F64)
                .collect()),
            (_, points) => Err(self.mismatch(points)),
        }
    }

    fn mismatch(&self, query: Coords<'_>) -> QueryError {
        QueryError::PrecisionMismatch {
            index: self.precision(),
            query: query.precision(),
        }
    }
}

impl From<KdTree<f32>> for Index {
    fn from(tree: KdTree<f32>) -> Self {
        Index::F32(tree)
    }
}

impl From<KdTree<f64>> for Index {
    fn from(tree: KdTree<f64>) -> Self {
        Index::F64(tree)
    }
}

fn query_one<T: Coord, I: NearestNeighbors<T>>(
    index: &I,
    point: &[T],
    k: usize,
    axis: Option<usize>,
) -> Result<Neighbors<T>, QueryError> {
    match axis {
        Some(axis) => Ok(Neighbors::Decomposed(index.query_decomposed(point, k, axis)?)),
        None => Ok(Neighbors::Plain(index.query(point, k)?)),
    }
}

fn query_many<T: Coord, I: NearestNeighbors<T>>(
    index: &I,
    points: &[T],
    k: usize,
    axis: Option<usize>,
) -> Result<Vec<Neighbors<T>>, QueryError> {
    match axis {
        Some(axis) => Ok(index
            .query_batch_decomposed(points, k, axis)?
            .into_iter()
            .map(Neighbors::Decomposed)
            .collect()),
        None => Ok(index.query_batch(points, k)?.into_iter().map(Neighbors::Plain).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINTS: [f64; 6] = [0.0, 0.0, 1.0, 1.0, 0.2, 0.1];

    #[test]
    fn test_precision_follows_points() {
        let points32: Vec<f32> = POINTS.iter().map(|&v| v as f32).collect();
        let a = Index::build(Coords::F64(&POINTS), 2, &BuildConfig::default(), None).unwrap();
        let b = Index::build(Coords::F32(&points32), 2, &BuildConfig::default(), None).unwrap();
        assert_eq!(a.precision(), Precision::F64);
        assert_eq!(b.precision(), Precision::F32);
        assert_eq!(a.len(), 3);
        assert_eq!(b.dim(), 2);
    }

    #[test]
    fn test_precision_mismatch() {
        let index = Index::build(Coords::F64(&POINTS), 2, &BuildConfig::default(), None).unwrap();
        assert_eq!(
            index.query(Coords::F32(&[0.0, 0.0]), 1, None),
            Err(QueryError::PrecisionMismatch {
                index: Precision::F64,
                query: Precision::F32
            })
        );
        assert_eq!(
            Index::build(Coords::F64(&POINTS), 2, &BuildConfig::default(), Some(Coords::F32(&[1.0, 1.0])))
                .unwrap_err(),
            BuildError::PrecisionMismatch {
                points: Precision::F64,
                periods: Precision::F32
            }
        );
    }

    #[test]
    fn test_plain_and_decomposed() {
        let index = Index::from(KdTree::new(&POINTS, 2).unwrap());
        let plain = index.query(Coords::F64(&[0.15, 0.1]), 2, None).unwrap();
        assert_eq!(plain.indices(), vec![2, 0]);
        match index.query(Coords::F64(&[0.15, 0.1]), 1, Some(0)).unwrap() {
            AnyNeighbors::F64(Neighbors::Decomposed(n)) => {
                assert_eq!(n[0].index, 2);
                assert!((n[0].parallel - 0.05).abs() < 1e-12);
                assert!(n[0].transverse.abs() < 1e-12);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_batch_preserves_order() {
        let index = Index::build(Coords::F64(&POINTS), 2, &BuildConfig::new(1, 2), None).unwrap();
        let results = index.query_batch(Coords::F64(&[1.0, 0.9, 0.0, 0.1, 0.3, 0.1]), 1, None).unwrap();
        let nearest: Vec<usize> = results.iter().map(|r| r.indices()[0]).collect();
        assert_eq!(nearest, vec![1, 0, 2]);
    }
}
