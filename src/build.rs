//! Recursive tree construction with a fork-join fan-out near the root.
//!
//! Nodes are laid out post-order in a single arena (children before their
//! parent, left subtree before right, root last). Above `par_split_level`
//! both halves of a split are built concurrently into private arenas which
//! are then relocated and appended in left-right order. The resulting layout
//! is identical to what the sequential recursion writes directly.

use crate::bounds::range_extent;
use crate::config::SplitRule;
use crate::float::Coord;
use crate::partition::{choose_axis, split_range, KdNode, NodeKind};
use tracing::trace;

/// Nodes plus their bounding boxes, `2 * dim` scalars per node (`min` then `max`).
#[derive(Debug)]
pub(crate) struct Arena<T> {
    pub nodes: Vec<KdNode<T>>,
    pub bounds: Vec<T>,
}

impl<T: Coord> Arena<T> {
    fn with_capacity(nodes: usize, dim: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            bounds: Vec::with_capacity(nodes * 2 * dim),
        }
    }

    /// Moves `other` onto the end of `self`, shifting its child links.
    /// Returns the new position of `other`'s root.
    fn append(&mut self, other: Arena<T>) -> usize {
        let base = self.nodes.len();
        self.nodes.extend(other.nodes.into_iter().map(|mut node| {
            if let NodeKind::Stem { left, right, .. } = &mut node.kind {
                *left += base;
                *right += base;
            }
            node
        }));
        self.bounds.extend(other.bounds);
        self.nodes.len() - 1
    }
}

pub(crate) struct Builder<'a, T> {
    pub points: &'a [T],
    pub dim: usize,
    pub leafsize: usize,
    pub split_rule: SplitRule,
    pub par_split_level: usize,
}

impl<'a, T: Coord> Builder<'a, T> {
    /// Builds the whole tree over `ids`, which is permuted in place into leaf order.
    pub fn build(&self, ids: &mut [usize]) -> Arena<T> {
        let mut arena = Arena::with_capacity(node_capacity(ids.len(), self.leafsize), self.dim);
        self.build_subtree(ids, 0, 0, &mut arena);
        arena
    }

    fn build_subtree(&self, ids: &mut [usize], offset: usize, depth: usize, arena: &mut Arena<T>) -> usize {
        let dim = self.dim;
        let count = ids.len();

        let mut min = vec![T::zero(); dim];
        let mut max = vec![T::zero(); dim];
        range_extent(self.points, dim, ids, &mut min, &mut max);

        if count <= self.leafsize {
            arena.bounds.extend_from_slice(&min);
            arena.bounds.extend_from_slice(&max);
            arena.nodes.push(KdNode {
                start: offset,
                end: offset + count,
                kind: NodeKind::Leaf,
            });
            return arena.nodes.len() - 1;
        }

        let axis = choose_axis(self.split_rule, depth, &min, &max);
        let (mid, split) = split_range(self.points, dim, ids, axis);
        let (left_ids, right_ids) = ids.split_at_mut(mid);

        let (left, right) = if depth < self.par_split_level {
            trace!(depth, count, "forking subtree build");
            let (left_arena, right_arena) = rayon::join(
                || self.detached(left_ids, offset, depth + 1),
                || self.detached(right_ids, offset + mid, depth + 1),
            );
            (arena.append(left_arena), arena.append(right_arena))
        } else {
            let left = self.build_subtree(left_ids, offset, depth + 1, arena);
            let right = self.build_subtree(right_ids, offset + mid, depth + 1, arena);
            (left, right)
        };

        arena.bounds.extend_from_slice(&min);
        arena.bounds.extend_from_slice(&max);
        arena.nodes.push(KdNode {
            start: offset,
            end: offset + count,
            kind: NodeKind::Stem { axis, split, left, right },
        });
        arena.nodes.len() - 1
    }

    fn detached(&self, ids: &mut [usize], offset: usize, depth: usize) -> Arena<T> {
        let mut arena = Arena::with_capacity(node_capacity(ids.len(), self.leafsize), self.dim);
        self.build_subtree(ids, offset, depth, &mut arena);
        arena
    }
}

/// Arena capacity for a subtree over `len` points.
fn node_capacity(len: usize, leafsize: usize) -> usize {
    2 * len.div_ceil(leafsize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_points(n: usize) -> Vec<f64> {
        let mut points = Vec::with_capacity(n * 3);
        for i in 0..n {
            let v = i as f64;
            points.extend_from_slice(&[(v * 0.37) % 1.0, (v * 0.61) % 1.0, (v * 0.13) % 1.0]);
        }
        points
    }

    #[test]
    fn test_node_capacity() {
        assert_eq!(node_capacity(5, 8), 2);
        assert_eq!(node_capacity(9, 4), 6);
        assert_eq!(node_capacity(100, 32), 8);
    }

    #[test]
    fn test_parallel_layout_matches_sequential() {
        let points = grid_points(1000);
        for rule in [SplitRule::WidestSpread, SplitRule::RoundRobin] {
            let mut seq_ids: Vec<usize> = (0..1000).collect();
            let mut par_ids = seq_ids.clone();
            let mut builder = Builder {
                points: &points,
                dim: 3,
                leafsize: 7,
                split_rule: rule,
                par_split_level: 0,
            };
            let seq = builder.build(&mut seq_ids);
            builder.par_split_level = 4;
            let par = builder.build(&mut par_ids);

            assert_eq!(seq.nodes, par.nodes);
            assert_eq!(seq.bounds, par.bounds);
            assert_eq!(seq_ids, par_ids);
            let leaves = seq.nodes.iter().filter(|n| n.is_leaf()).count();
            assert_eq!(seq.nodes.len(), 2 * leaves - 1);
        }
    }

    #[test]
    fn test_root_is_last_and_spans_everything() {
        let points = grid_points(50);
        let mut ids: Vec<usize> = (0..50).collect();
        let builder = Builder {
            points: &points,
            dim: 3,
            leafsize: 4,
            split_rule: SplitRule::WidestSpread,
            par_split_level: 2,
        };
        let arena = builder.build(&mut ids);
        let root = arena.nodes.last().unwrap();
        assert_eq!((root.start, root.end), (0, 50));
        for node in &arena.nodes {
            if let NodeKind::Stem { left, right, .. } = node.kind {
                assert_eq!(arena.nodes[left].start, node.start);
                assert_eq!(arena.nodes[left].end, arena.nodes[right].start);
                assert_eq!(arena.nodes[right].end, node.end);
            } else {
                assert!(node.end - node.start >= 1 && node.end - node.start <= 4);
            }
        }
    }
}
