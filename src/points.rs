//! Immutable row-major point buffer.

use crate::bounds::Periodicity;
use crate::error::{KdTreeError, Result};

/// `n` points in `d` dimensions stored contiguously, `[x0, y0, .., x1, y1, ..]`.
///
/// Construction rejects empty dimensionality, ragged buffers and non-finite
/// coordinates, so every store handed to the builder is valid.
#[derive(Clone, Debug)]
pub struct PointStore {
    coords: Vec<f64>,
    dims: usize,
    periodicity: Periodicity,
}

impl PointStore {
    /// Points with plain Euclidean distances.
    pub fn new(coords: Vec<f64>, dims: usize) -> Result<Self> {
        Self::with_periodicity(coords, dims, Periodicity::none())
    }

    /// Points whose axes wrap at the given lengths (`0` disables wrapping on an axis).
    pub fn with_periodic_lengths(coords: Vec<f64>, dims: usize, lengths: &[f64]) -> Result<Self> {
        if dims == 0 {
            return Err(KdTreeError::ZeroDimensions);
        }
        let periodicity = Periodicity::new(lengths, dims)?;
        Self::with_periodicity(coords, dims, periodicity)
    }

    pub fn with_periodicity(coords: Vec<f64>, dims: usize, periodicity: Periodicity) -> Result<Self> {
        if dims == 0 {
            return Err(KdTreeError::ZeroDimensions);
        }
        if coords.len() % dims != 0 {
            return Err(KdTreeError::RaggedCoordinates { len: coords.len(), dims });
        }
        if periodicity.is_periodic() && periodicity.lengths().len() != dims {
            return Err(KdTreeError::PeriodicLengthMismatch {
                expected: dims,
                got: periodicity.lengths().len(),
            });
        }
        if let Some(pos) = coords.iter().position(|v| !v.is_finite()) {
            return Err(KdTreeError::NonFiniteCoordinate {
                point: pos / dims,
                axis: pos % dims,
            });
        }

        Ok(Self { coords, dims, periodicity })
    }

    pub fn len(&self) -> usize {
        self.coords.len() / self.dims
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    pub fn periodicity(&self) -> &Periodicity {
        &self.periodicity
    }

    pub(crate) fn into_coords(self) -> Vec<f64> {
        self.coords
    }

    #[inline]
    pub fn point(&self, index: usize) -> &[f64] {
        let start = index * self.dims;
        &self.coords[start..start + self.dims]
    }

    #[inline]
    pub(crate) fn coord(&self, index: usize, axis: usize) -> f64 {
        self.coords[index * self.dims + axis]
    }

    /// Squared distance from stored point `index` to `query`.
    #[inline]
    pub fn dist_sq(&self, index: usize, query: &[f64]) -> f64 {
        self.periodicity.dist_sq(self.point(index), query)
    }

    /// Squared distance from `query` to the box spanned by `min` and `max`.
    #[inline]
    pub fn box_dist_sq(&self, query: &[f64], min: &[f64], max: &[f64]) -> f64 {
        self.periodicity.box_dist_sq(query, min, max)
    }
}
