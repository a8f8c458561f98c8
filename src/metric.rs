//! Euclidean distances under optional per-axis periodic wraparound.
//!
//! Periodic axes use the minimum-image convention: the displacement `d`
//! between two coordinates is replaced by `d - L * round(d / L)` for period
//! `L`. Box distances are lower bounds on the distance to any point inside
//! the box and are what the query engine prunes with.

use crate::error::BuildError;
use crate::float::Coord;

#[derive(Clone, Debug, PartialEq)]
pub struct Metric<T> {
    periods: Option<Vec<T>>,
}

impl<T: Coord> Metric<T> {
    pub fn euclidean() -> Self {
        Self { periods: None }
    }

    /// Periodic metric over the box `[0, periods[axis])`. Every period must be
    /// positive and finite.
    pub fn periodic(periods: &[T]) -> Result<Self, BuildError> {
        for (axis, &period) in periods.iter().enumerate() {
            if !(period.is_finite() && period > T::zero()) {
                return Err(BuildError::InvalidPeriod {
                    axis,
                    period: period.to_f64().unwrap_or(f64::NAN),
                });
            }
        }
        Ok(Self { periods: Some(periods.to_vec()) })
    }

    pub fn periods(&self) -> Option<&[T]> {
        self.periods.as_deref()
    }

    pub fn is_periodic(&self) -> bool {
        self.periods.is_some()
    }

    /// Signed displacement `a - b` along `axis`, folded to the minimum image.
    #[inline]
    pub fn axis_delta(&self, axis: usize, a: T, b: T) -> T {
        let d = a - b;
        match &self.periods {
            Some(periods) => {
                let period = periods[axis];
                d - period * (d / period).round()
            }
            None => d,
        }
    }

    #[inline]
    pub fn dist_sq(&self, a: &[T], b: &[T]) -> T {
        let mut acc = T::zero();
        for axis in 0..a.len() {
            let d = self.axis_delta(axis, a[axis], b[axis]);
            acc = acc + d * d;
        }
        acc
    }

    pub fn dist(&self, a: &[T], b: &[T]) -> T {
        self.dist_sq(a, b).sqrt()
    }

    /// Squared distance from `point` to the nearest point of the box `[min, max]`.
    ///
    /// For periodic metrics `point` must already lie in the periodic box (see
    /// [`Metric::normalize`]) and the box must lie within `[0, period]`.
    #[inline]
    pub fn box_dist_sq(&self, point: &[T], min: &[T], max: &[T]) -> T {
        let mut acc = T::zero();
        for axis in 0..point.len() {
            let v = point[axis];
            let (lo, hi) = (min[axis], max[axis]);
            // The wrapped gap goes through `axis_delta` so it rounds exactly
            // like the point distance it has to stay below.
            let gap = if v < lo {
                (lo - v).min(self.axis_delta(axis, v, hi).abs())
            } else if v > hi {
                (v - hi).min(self.axis_delta(axis, v, lo).abs())
            } else {
                T::zero()
            };
            acc = acc + gap * gap;
        }
        acc
    }

    /// Parallel and transverse components of the displacement between `a` and `b`.
    ///
    /// The parallel component is the absolute minimum-image displacement along
    /// `axis`; the transverse component is the Euclidean norm over every other axis.
    pub fn decomposed(&self, a: &[T], b: &[T], axis: usize) -> (T, T) {
        let mut transverse = T::zero();
        let mut parallel = T::zero();
        for i in 0..a.len() {
            let d = self.axis_delta(i, a[i], b[i]);
            if i == axis {
                parallel = d.abs();
            } else {
                transverse = transverse + d * d;
            }
        }
        (parallel, transverse.sqrt())
    }

    /// Wraps every coordinate into `[0, period)`. No-op for non-periodic metrics.
    pub fn normalize(&self, point: &[T]) -> Vec<T> {
        let mut out = Vec::with_capacity(point.len());
        self.normalize_into(point, &mut out);
        out
    }

    pub(crate) fn normalize_into(&self, point: &[T], out: &mut Vec<T>) {
        out.clear();
        match &self.periods {
            Some(periods) => out.extend(point.iter().zip(periods).map(|(&v, &period)| wrap(v, period))),
            None => out.extend_from_slice(point),
        }
    }
}

fn wrap<T: Coord>(v: T, period: T) -> T {
    let mut r = v % period;
    if r < T::zero() {
        r = r + period;
    }
    // -tiny % period + period can round up to exactly period
    if r >= period { T::zero() } else { r }
}
