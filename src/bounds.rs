use crate::error::{KdTreeError, Result};

/// Axis-aligned bounding box in `d`-dimensional space.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl BoundingBox {
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Self {
        Self { min, max }
    }

    pub fn dims(&self) -> usize {
        self.min.len()
    }

    /// Returns true if `point` lies inside the box, boundaries included.
    pub fn contains(&self, point: &[f64]) -> bool {
        point
            .iter()
            .zip(self.min.iter().zip(&self.max))
            .all(|(&v, (&lo, &hi))| v >= lo && v <= hi)
    }

    /// Length of the box along `axis`.
    pub fn extent(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }
}

/// Per-axis wrap lengths for toroidal distances.
///
/// A length of `0` leaves the axis unwrapped. When no axis wraps the lengths are
/// dropped entirely so plain Euclidean distances take the fast path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Periodicity {
    lengths: Vec<f64>,
}

impl Periodicity {
    /// Plain Euclidean distances on every axis.
    pub fn none() -> Self {
        Self::default()
    }

    /// Validates `lengths` against the dimensionality `dims`.
    pub fn new(lengths: &[f64], dims: usize) -> Result<Self> {
        if lengths.len() != dims {
            return Err(KdTreeError::PeriodicLengthMismatch {
                expected: dims,
                got: lengths.len(),
            });
        }
        for (axis, &value) in lengths.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(KdTreeError::InvalidPeriod { axis, value });
            }
        }

        if lengths.iter().all(|&l| l == 0.0) {
            return Ok(Self::none());
        }
        Ok(Self { lengths: lengths.to_vec() })
    }

    /// True if at least one axis wraps.
    pub fn is_periodic(&self) -> bool {
        !self.lengths.is_empty()
    }

    /// Wrap lengths per axis, or an empty slice when nothing wraps.
    pub fn lengths(&self) -> &[f64] {
        &self.lengths
    }

    #[inline]
    fn length(&self, axis: usize) -> Option<f64> {
        match self.lengths.get(axis) {
            Some(&l) if l > 0.0 => Some(l),
            _ => None,
        }
    }

    /// Distance between two coordinates along `axis`, taking the shorter way
    /// around when the axis wraps.
    #[inline]
    pub fn axis_delta(&self, axis: usize, a: f64, b: f64) -> f64 {
        let delta = (a - b).abs();
        match self.length(axis) {
            Some(l) => {
                let delta = delta % l;
                delta.min(l - delta)
            }
            None => delta,
        }
    }

    /// Gap between coordinate `v` and the interval `[lo, hi]` along `axis`.
    #[inline]
    pub fn axis_gap(&self, axis: usize, v: f64, lo: f64, hi: f64) -> f64 {
        match self.length(axis) {
            Some(l) => {
                let width = hi - lo;
                if width >= l || (v >= lo && v <= hi) {
                    return 0.0;
                }
                // Offset of v past the start of the interval, measured around the circle.
                if (v - lo).rem_euclid(l) <= width {
                    return 0.0;
                }
                // Outside the arc the nearest spot is one of its ends.
                self.axis_delta(axis, v, lo).min(self.axis_delta(axis, v, hi))
            }
            None => {
                if v < lo {
                    lo - v
                } else if v > hi {
                    v - hi
                } else {
                    0.0
                }
            }
        }
    }

    /// Squared distance between two points.
    #[inline]
    pub fn dist_sq(&self, a: &[f64], b: &[f64]) -> f64 {
        if self.lengths.is_empty() {
            return a
                .iter()
                .zip(b)
                .map(|(&x, &y)| (x - y) * (x - y))
                .sum();
        }
        let mut d2 = 0.0;
        for (axis, (&x, &y)) in a.iter().zip(b).enumerate() {
            let delta = self.axis_delta(axis, x, y);
            d2 += delta * delta;
        }
        d2
    }

    /// Squared distance from `point` to the box spanned by `min` and `max`.
    /// Zero when the point lies inside.
    #[inline]
    pub fn box_dist_sq(&self, point: &[f64], min: &[f64], max: &[f64]) -> f64 {
        let mut d2 = 0.0;
        for axis in 0..point.len() {
            let gap = self.axis_gap(axis, point[axis], min[axis], max[axis]);
            d2 += gap * gap;
        }
        d2
    }
}
