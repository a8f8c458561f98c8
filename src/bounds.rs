use crate::error::BuildError;
use crate::float::Coord;

/// Axis-aligned bounding box in `dim`-dimensional space.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox<T> {
    pub min: Vec<T>,
    pub max: Vec<T>,
}

impl<T: Coord> BoundingBox<T> {
    /// Tight extent of a flat coordinate buffer. Rejects an empty set.
    pub fn from_points(points: &[T], dim: usize) -> Result<Self, BuildError> {
        if dim == 0 {
            return Err(BuildError::ZeroDimension);
        }
        if points.is_empty() {
            return Err(BuildError::EmptyInput);
        }
        let mut min = vec![T::infinity(); dim];
        let mut max = vec![T::neg_infinity(); dim];
        for p in points.chunks_exact(dim) {
            for axis in 0..dim {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Ok(Self { min, max })
    }

    /// The torus domain `[0, period)` per axis. The data extent is not consulted.
    pub fn periodic(periods: &[T]) -> Self {
        Self {
            min: vec![T::zero(); periods.len()],
            max: periods.to_vec(),
        }
    }

    pub fn dim(&self) -> usize {
        self.min.len()
    }

    pub fn extent(&self, axis: usize) -> T {
        self.max[axis] - self.min[axis]
    }

    /// Axis of greatest extent. Ties go to the lowest axis.
    pub fn widest_axis(&self) -> usize {
        widest_axis(&self.min, &self.max)
    }
}

/// Writes the extent of the points selected by `ids` into `min`/`max`.
pub(crate) fn range_extent<T: Coord>(points: &[T], dim: usize, ids: &[usize], min: &mut [T], max: &mut [T]) {
    min.fill(T::infinity());
    max.fill(T::neg_infinity());
    for &id in ids {
        let p = &points[id * dim..(id + 1) * dim];
        for axis in 0..dim {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
}

pub(crate) fn widest_axis<T: Coord>(min: &[T], max: &[T]) -> usize {
    let mut best = 0;
    let mut best_extent = T::neg_infinity();
    for axis in 0..min.len() {
        let extent = max[axis] - min[axis];
        if extent > best_extent {
            best = axis;
            best_extent = extent;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let points = [0.5, 2.0, -1.0, 1.5, 0.0, 3.0];
        let b = BoundingBox::<f64>::from_points(&points, 3).unwrap();
        assert_eq!(b.min, vec![0.5, 0.0, -1.0]);
        assert_eq!(b.max, vec![1.5, 2.0, 3.0]);
        assert_eq!(b.widest_axis(), 2);
        assert_eq!(b.dim(), 3);
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(BoundingBox::<f32>::from_points(&[], 3), Err(BuildError::EmptyInput));
        assert_eq!(BoundingBox::<f32>::from_points(&[1.0], 0), Err(BuildError::ZeroDimension));
    }

    #[test]
    fn test_periodic_ignores_data() {
        let b = BoundingBox::periodic(&[1.0_f64, 2.0]);
        assert_eq!(b.min, vec![0.0, 0.0]);
        assert_eq!(b.max, vec![1.0, 2.0]);
        assert_eq!(b.extent(1), 2.0);
    }

    #[test]
    fn test_range_extent_subset() {
        let points = [0.0_f64, 0.0, 5.0, 5.0, 1.0, 2.0];
        let mut min = [0.0; 2];
        let mut max = [0.0; 2];
        range_extent(&points, 2, &[0, 2], &mut min, &mut max);
        assert_eq!(min, [0.0, 0.0]);
        assert_eq!(max, [1.0, 2.0]);
    }

    #[test]
    fn test_widest_axis_tie_goes_low() {
        assert_eq!(widest_axis(&[0.0_f64, 0.0], &[1.0, 1.0]), 0);
    }
}
