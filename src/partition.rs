use crate::bounds::widest_axis;
use crate::config::SplitRule;
use crate::float::Coord;
use std::cmp::Ordering;

/// Arena node. Every node owns the contiguous span `start..end` of the
/// reordered point buffer; a stem's children split that span at its median.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct KdNode<T> {
    pub start: usize,
    pub end: usize,
    pub kind: NodeKind<T>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum NodeKind<T> {
    Leaf,
    Stem {
        axis: usize,
        split: T,
        left: usize,
        right: usize,
    },
}

impl<T> KdNode<T> {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf)
    }
}

pub(crate) fn choose_axis<T: Coord>(rule: SplitRule, depth: usize, min: &[T], max: &[T]) -> usize {
    match rule {
        SplitRule::WidestSpread => widest_axis(min, max),
        SplitRule::RoundRobin => depth % min.len(),
    }
}

/// Median partition of `ids` along `axis`.
///
/// On return `ids[..mid]` hold coordinates `<=` the split value and
/// `ids[mid..]` hold coordinates `>=` it, with `mid = ids.len() / 2`. Equal
/// coordinates are ordered by id, so the partition is fully determined by
/// the input and never depends on scheduling.
pub(crate) fn split_range<T: Coord>(points: &[T], dim: usize, ids: &mut [usize], axis: usize) -> (usize, T) {
    let mid = ids.len() / 2;
    ids.select_nth_unstable_by(mid, |&a, &b| {
        let va = points[a * dim + axis];
        let vb = points[b * dim + axis];
        va.partial_cmp(&vb).unwrap_or(Ordering::Equal).then(a.cmp(&b))
    });
    (mid, points[ids[mid] * dim + axis])
}
