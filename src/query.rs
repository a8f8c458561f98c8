//! Exact k-nearest-neighbor search over a built [`KdTree`].
//!
//! The search is a depth-first branch-and-bound descent: at every stem the
//! child whose bounding box is closer to the query is visited first, and a
//! child is skipped once its box lies further away than the current k-th
//! best candidate. Leaves are scanned exhaustively. Periodic trees use the
//! minimum-image metric for both the box bounds and the point distances, so
//! a single descent covers every periodic image.
//!
//! Batches are dispatched over rayon with one [`KnnScratch`] per worker.
//! Every query point is validated before any search starts, so a batch
//! either fails as a whole or returns one result per query, in input order.

use crate::candidates::{Candidate, Candidates};
use crate::error::QueryError;
use crate::float::Coord;
use crate::kdtree::KdTree;
use crate::partition::NodeKind;
use rayon::prelude::*;
use tracing::debug;

/// One neighbor of a query point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor<T> {
    pub distance: T,
    /// Index of the point in the buffer the tree was built from.
    pub index: usize,
}

/// One neighbor with its displacement split into a component along a chosen
/// axis and the norm over the remaining axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecomposedNeighbor<T> {
    pub parallel: T,
    pub transverse: T,
    pub index: usize,
}

/// Reusable per-thread search state.
///
/// Callers issuing many sequential queries can keep one of these around and
/// pass it to [`KdTree::query_with`] to avoid reallocating the candidate heap.
#[derive(Clone, Debug, Default)]
pub struct KnnScratch<T: Coord> {
    candidates: Candidates<T>,
    query: Vec<T>,
}

impl<T: Coord> KnnScratch<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The query interface of a nearest-neighbor index.
pub trait NearestNeighbors<T: Coord>: Send + Sync {
    fn dim(&self) -> usize;

    fn len(&self) -> usize;

    fn query(&self, point: &[T], k: usize) -> Result<Vec<Neighbor<T>>, QueryError>;

    fn query_decomposed(&self, point: &[T], k: usize, axis: usize) -> Result<Vec<DecomposedNeighbor<T>>, QueryError>;

    fn query_batch(&self, points: &[T], k: usize) -> Result<Vec<Vec<Neighbor<T>>>, QueryError>;

    fn query_batch_decomposed(
        &self,
        points: &[T],
        k: usize,
        axis: usize,
    ) -> Result<Vec<Vec<DecomposedNeighbor<T>>>, QueryError>;
}

impl<T: Coord> KdTree<T> {
    /// The `k` nearest points to `point`, sorted by ascending distance.
    ///
    /// Fails if `k` is zero or exceeds the number of indexed points, or if
    /// `point` does not have exactly [`KdTree::dim`] finite coordinates.
    pub fn query(&self, point: &[T], k: usize) -> Result<Vec<Neighbor<T>>, QueryError> {
        self.query_with(point, k, &mut KnnScratch::new())
    }

    /// Like [`KdTree::query`], reusing the buffers in `scratch`.
    pub fn query_with(&self, point: &[T], k: usize, scratch: &mut KnnScratch<T>) -> Result<Vec<Neighbor<T>>, QueryError> {
        self.check_k(k)?;
        self.check_point(point)?;
        Ok(self.neighbors(point, k, scratch))
    }

    /// The single nearest point to `point`.
    pub fn query_nearest(&self, point: &[T]) -> Result<Neighbor<T>, QueryError> {
        self.check_point(point)?;
        let mut scratch = KnnScratch::new();
        self.search(point, 1, &mut scratch);
        let best = scratch.candidates.drain_sorted()[0];
        Ok(self.neighbor(best))
    }

    /// The `k` nearest points to `point`, each reported as its displacement
    /// along `axis` and its distance in the plane transverse to `axis`.
    ///
    /// Neighbors are ranked by full distance.
    pub fn query_decomposed(&self, point: &[T], k: usize, axis: usize) -> Result<Vec<DecomposedNeighbor<T>>, QueryError> {
        self.check_k(k)?;
        self.check_axis(axis)?;
        self.check_point(point)?;
        Ok(self.decomposed_neighbors(point, k, axis, &mut KnnScratch::new()))
    }

    /// [`KdTree::query`] for every point of a flat buffer, in parallel.
    pub fn query_batch(&self, points: &[T], k: usize) -> Result<Vec<Vec<Neighbor<T>>>, QueryError> {
        self.check_k(k)?;
        self.check_batch(points)?;
        Ok(self.run_batch(points, |tree, q, scratch| tree.neighbors(q, k, scratch)))
    }

    /// [`KdTree::query_nearest`] for every point of a flat buffer, in parallel.
    pub fn query_batch_nearest(&self, points: &[T]) -> Result<Vec<Neighbor<T>>, QueryError> {
        self.check_batch(points)?;
        Ok(self.run_batch(points, |tree, q, scratch| {
            tree.search(q, 1, scratch);
            tree.neighbor(scratch.candidates.drain_sorted()[0])
        }))
    }

    /// [`KdTree::query_decomposed`] for every point of a flat buffer, in parallel.
    pub fn query_batch_decomposed(
        &self,
        points: &[T],
        k: usize,
        axis: usize,
    ) -> Result<Vec<Vec<DecomposedNeighbor<T>>>, QueryError> {
        self.check_k(k)?;
        self.check_axis(axis)?;
        self.check_batch(points)?;
        Ok(self.run_batch(points, |tree, q, scratch| tree.decomposed_neighbors(q, k, axis, scratch)))
    }

    /// Distances only, flattened to `k` values per query.
    pub fn query_batch_distances(&self, points: &[T], k: usize) -> Result<Vec<T>, QueryError> {
        let (distances, _) = self.query_batch_flat(points, k)?;
        Ok(distances)
    }

    /// Distances and original indices, each flattened to `k` values per query.
    pub fn query_batch_flat(&self, points: &[T], k: usize) -> Result<(Vec<T>, Vec<usize>), QueryError> {
        let results = self.query_batch(points, k)?;
        let mut distances = Vec::with_capacity(results.len() * k);
        let mut indices = Vec::with_capacity(results.len() * k);
        for neighbor in results.iter().flatten() {
            distances.push(neighbor.distance);
            indices.push(neighbor.index);
        }
        Ok((distances, indices))
    }

    fn run_batch<R, F>(&self, points: &[T], f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(&Self, &[T], &mut KnnScratch<T>) -> R + Send + Sync,
    {
        debug!(queries = points.len() / self.dim, "dispatching batch query");
        let dispatch = || {
            points
                .par_chunks_exact(self.dim)
                .map_init(KnnScratch::new, |scratch, q| f(self, q, scratch))
                .collect()
        };
        match &self.pool {
            Some(pool) => pool.install(dispatch),
            None => dispatch(),
        }
    }

    fn neighbors(&self, point: &[T], k: usize, scratch: &mut KnnScratch<T>) -> Vec<Neighbor<T>> {
        self.search(point, k, scratch);
        scratch
            .candidates
            .drain_sorted()
            .into_iter()
            .map(|c| self.neighbor(c))
            .collect()
    }

    fn decomposed_neighbors(
        &self,
        point: &[T],
        k: usize,
        axis: usize,
        scratch: &mut KnnScratch<T>,
    ) -> Vec<DecomposedNeighbor<T>> {
        self.search(point, k, scratch);
        let query = &scratch.query;
        let sorted = scratch.candidates.drain_sorted();
        sorted
            .into_iter()
            .map(|c| {
                let (parallel, transverse) = self.metric.decomposed(query, self.stored_point(c.pos), axis);
                DecomposedNeighbor {
                    parallel,
                    transverse,
                    index: c.index,
                }
            })
            .collect()
    }

    fn neighbor(&self, c: Candidate<T>) -> Neighbor<T> {
        Neighbor {
            distance: c.dist_sq.sqrt(),
            index: c.index,
        }
    }

    /// Fills `scratch.candidates` with the `k` best candidates for `point`.
    fn search(&self, point: &[T], k: usize, scratch: &mut KnnScratch<T>) {
        self.metric.normalize_into(point, &mut scratch.query);
        scratch.candidates.reset(k);
        self.search_node(self.root(), &scratch.query, &mut scratch.candidates);
    }

    fn search_node(&self, node_idx: usize, query: &[T], candidates: &mut Candidates<T>) {
        let node = &self.nodes[node_idx];
        match node.kind {
            NodeKind::Leaf => {
                for pos in node.start..node.end {
                    let dist_sq = self.metric.dist_sq(query, self.stored_point(pos));
                    if dist_sq <= candidates.worst_dist_sq() {
                        candidates.offer(Candidate {
                            dist_sq,
                            index: self.indices[pos],
                            pos,
                        });
                    }
                }
            }
            NodeKind::Stem { axis, split, left, right } => {
                let d_left = self.box_dist_sq(left, query);
                let d_right = self.box_dist_sq(right, query);
                let left_first = if d_left == d_right { query[axis] <= split } else { d_left < d_right };
                let (first, d_first, second, d_second) = if left_first {
                    (left, d_left, right, d_right)
                } else {
                    (right, d_right, left, d_left)
                };

                // Equal bounds are still visited: they may hold an equidistant
                // point with a lower index.
                if d_first <= candidates.worst_dist_sq() {
                    self.search_node(first, query, candidates);
                }
                if d_second <= candidates.worst_dist_sq() {
                    self.search_node(second, query, candidates);
                }
            }
        }
    }

    #[inline]
    fn box_dist_sq(&self, node: usize, query: &[T]) -> T {
        let (min, max) = self.node_box(node);
        self.metric.box_dist_sq(query, min, max)
    }

    fn check_k(&self, k: usize) -> Result<(), QueryError> {
        if k == 0 {
            return Err(QueryError::ZeroK);
        }
        if k > self.len() {
            return Err(QueryError::KTooLarge { k, len: self.len() });
        }
        Ok(())
    }

    fn check_axis(&self, axis: usize) -> Result<(), QueryError> {
        if axis >= self.dim {
            return Err(QueryError::AxisOutOfRange { axis, dim: self.dim });
        }
        Ok(())
    }

    fn check_point(&self, point: &[T]) -> Result<(), QueryError> {
        if point.len() != self.dim {
            return Err(QueryError::DimensionMismatch {
                expected: self.dim,
                found: point.len(),
            });
        }
        if let Some(axis) = point.iter().position(|v| !v.is_finite()) {
            return Err(QueryError::NonFiniteQuery { axis });
        }
        Ok(())
    }

    fn check_batch(&self, points: &[T]) -> Result<(), QueryError> {
        if points.len() % self.dim != 0 {
            return Err(QueryError::RaggedQuery {
                len: points.len(),
                dim: self.dim,
            });
        }
        points.chunks_exact(self.dim).try_for_each(|q| self.check_point(q))
    }
}

impl<T: Coord> NearestNeighbors<T> for KdTree<T> {
    fn dim(&self) -> usize {
        KdTree::dim(self)
    }

    fn len(&self) -> usize {
        KdTree::len(self)
    }

    fn query(&self, point: &[T], k: usize) -> Result<Vec<Neighbor<T>>, QueryError> {
        KdTree::query(self, point, k)
    }

    fn query_decomposed(&self, point: &[T], k: usize, axis: usize) -> Result<Vec<DecomposedNeighbor<T>>, QueryError> {
        KdTree::query_decomposed(self, point, k, axis)
    }

    fn query_batch(&self, points: &[T], k: usize) -> Result<Vec<Vec<Neighbor<T>>>, QueryError> {
        KdTree::query_batch(self, points, k)
    }

    fn query_batch_decomposed(
        &self,
        points: &[T],
        k: usize,
        axis: usize,
    ) -> Result<Vec<Vec<DecomposedNeighbor<T>>>, QueryError> {
        KdTree::query_batch_decomposed(self, points, k, axis)
    }
}
