use crate::bounds::BoundingBox;
use crate::build::Builder;
use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::float::{Coord, Precision};
use crate::metric::Metric;
use crate::partition::{KdNode, NodeKind};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use tracing::debug;

/// An immutable kd-tree over a fixed set of points.
///
/// The tree owns a reordered copy of the input: the points of every leaf are
/// stored contiguously, together with the permutation back to the caller's
/// original indices. Once built it is never mutated, so it can be shared by
/// any number of concurrent queries.
#[derive(Clone, Debug)]
pub struct KdTree<T: Coord> {
    pub(crate) dim: usize,
    pub(crate) leafsize: usize,
    /// Point coordinates in leaf order.
    pub(crate) points: Vec<T>,
    /// `indices[pos]` is the original index of the point stored at `pos`.
    pub(crate) indices: Vec<usize>,
    /// Inverse of `indices`.
    positions: Vec<usize>,
    pub(crate) nodes: Vec<KdNode<T>>,
    /// `2 * dim` scalars per node: `min` then `max`.
    pub(crate) node_bounds: Vec<T>,
    pub(crate) metric: Metric<T>,
    bounds: BoundingBox<T>,
    height: usize,
    pub(crate) pool: Option<Arc<ThreadPool>>,
}

impl<T: Coord> KdTree<T> {
    /// Builds a non-periodic tree with the default [`BuildConfig`].
    pub fn new(points: &[T], dim: usize) -> Result<Self, BuildError> {
        Self::build(points, dim, &BuildConfig::default(), None)
    }

    /// Builds a periodic tree over the box `[0, periods[axis]]` with the default [`BuildConfig`].
    pub fn new_periodic(points: &[T], dim: usize, periods: &[T]) -> Result<Self, BuildError> {
        Self::build(points, dim, &BuildConfig::default(), Some(periods))
    }

    /// Builds a tree from a flat coordinate buffer `[x0, y0, .., x1, y1, ..]`.
    ///
    /// # Arguments
    ///
    /// * `points` - Coordinates, `dim` scalars per point.
    /// * `dim` - Number of axes.
    /// * `config` - Leaf size, parallel split level, split rule and worker pool.
    /// * `periods` - Per-axis period for periodic boundaries. All points must
    ///   then lie in `[0, period]` on every axis.
    pub fn build(points: &[T], dim: usize, config: &BuildConfig, periods: Option<&[T]>) -> Result<Self, BuildError> {
        config.validate()?;
        check_points(points, dim)?;
        let count = points.len() / dim;

        let (metric, bounds) = match periods {
            Some(periods) => {
                if periods.len() != dim {
                    return Err(BuildError::PeriodicDimensionMismatch {
                        expected: dim,
                        found: periods.len(),
                    });
                }
                let metric = Metric::periodic(periods)?;
                check_inside_box(points, periods)?;
                (metric, BoundingBox::periodic(periods))
            }
            None => (Metric::euclidean(), BoundingBox::from_points(points, dim)?),
        };

        let pool = match config.num_threads {
            Some(n) => Some(Arc::new(
                ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| BuildError::ThreadPool(e.to_string()))?,
            )),
            None => None,
        };

        debug!(
            count,
            dim,
            leafsize = config.leafsize,
            par_split_level = config.par_split_level,
            periodic = periods.is_some(),
            "building kd-tree"
        );

        let builder = Builder {
            points,
            dim,
            leafsize: config.leafsize,
            split_rule: config.split_rule,
            par_split_level: config.par_split_level,
        };
        let mut indices: Vec<usize> = (0..count).collect();
        let arena = match &pool {
            Some(pool) => pool.install(|| builder.build(&mut indices)),
            None => builder.build(&mut indices),
        };

        let mut reordered = Vec::with_capacity(points.len());
        let mut positions = vec![0; count];
        for (pos, &original) in indices.iter().enumerate() {
            reordered.extend_from_slice(&points[original * dim..(original + 1) * dim]);
            positions[original] = pos;
        }

        let height = subtree_height(&arena.nodes, arena.nodes.len() - 1);
        debug!(nodes = arena.nodes.len(), height, "kd-tree built");

        Ok(Self {
            dim,
            leafsize: config.leafsize,
            points: reordered,
            indices,
            positions,
            nodes: arena.nodes,
            node_bounds: arena.bounds,
            metric,
            bounds,
            height,
            pool,
        })
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn leafsize(&self) -> usize {
        self.leafsize
    }

    pub fn precision(&self) -> Precision {
        T::PRECISION
    }

    /// Total number of nodes, stems and leaves.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges on the longest root-to-leaf path. A single-leaf tree has height 0.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The data extent, or the periodic domain for periodic trees.
    pub fn bounds(&self) -> &BoundingBox<T> {
        &self.bounds
    }

    pub fn periods(&self) -> Option<&[T]> {
        self.metric.periods()
    }

    pub fn metric(&self) -> &Metric<T> {
        &self.metric
    }

    /// Original index of the point stored at position `pos` of the leaf order.
    pub fn original_index(&self, pos: usize) -> Option<usize> {
        self.indices.get(pos).copied()
    }

    /// Coordinates of the point with the given original index.
    pub fn point(&self, original: usize) -> Option<&[T]> {
        let pos = *self.positions.get(original)?;
        Some(&self.points[pos * self.dim..(pos + 1) * self.dim])
    }

    /// Original indices held by each leaf, in leaf order.
    pub fn leaves(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.nodes
            .iter()
            .filter(|node| node.is_leaf())
            .map(|node| &self.indices[node.start..node.end])
    }

    pub(crate) fn root(&self) -> usize {
        self.nodes.len() - 1
    }

    #[inline]
    pub(crate) fn node_box(&self, node: usize) -> (&[T], &[T]) {
        let base = node * 2 * self.dim;
        (
            &self.node_bounds[base..base + self.dim],
            &self.node_bounds[base + self.dim..base + 2 * self.dim],
        )
    }

    #[inline]
    pub(crate) fn stored_point(&self, pos: usize) -> &[T] {
        &self.points[pos * self.dim..(pos + 1) * self.dim]
    }
}

fn check_points<T: Coord>(points: &[T], dim: usize) -> Result<(), BuildError> {
    if dim == 0 {
        return Err(BuildError::ZeroDimension);
    }
    if points.is_empty() {
        return Err(BuildError::EmptyInput);
    }
    if points.len() % dim != 0 {
        return Err(BuildError::RaggedInput { len: points.len(), dim });
    }
    for (point, p) in points.chunks_exact(dim).enumerate() {
        if let Some(axis) = p.iter().position(|v| !v.is_finite()) {
            return Err(BuildError::NonFiniteCoordinate { point, axis });
        }
    }
    Ok(())
}

fn check_inside_box<T: Coord>(points: &[T], periods: &[T]) -> Result<(), BuildError> {
    for (point, p) in points.chunks_exact(periods.len()).enumerate() {
        for (axis, (&v, &period)) in p.iter().zip(periods).enumerate() {
            if v < T::zero() || v > period {
                return Err(BuildError::OutsidePeriodicBox { point, axis });
            }
        }
    }
    Ok(())
}

fn subtree_height<T>(nodes: &[KdNode<T>], node: usize) -> usize {
    match nodes[node].kind {
        NodeKind::Leaf => 0,
        NodeKind::Stem { left, right, .. } => 1 + subtree_height(nodes, left).max(subtree_height(nodes, right)),
    }
}
