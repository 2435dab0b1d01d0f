//! Batch queries fanned out over worker threads.

use crate::error::{KdTreeError, Result};
use crate::kdtree::KdTree;
use crate::traversal::{Scratch, SearchParams};
use log::{trace, warn};
use rayon::prelude::*;

/// Number of queries a worker takes at a time unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Options for [`KdTree::query`] and [`KdTree::query_point`].
///
/// ```
/// use kdsearch::{KdTree, QueryOptions};
///
/// let tree = KdTree::build(vec![0.0, 1.0, 2.0, 3.0], 1, 2, None).unwrap();
/// let options = QueryOptions::new().k(2).threads(1);
/// let result = tree.query(&[2.9], 1, &options).unwrap();
/// assert_eq!(result.row(0).0, &[3, 2]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct QueryOptions {
    /// Neighbours per query.
    pub k: usize,
    /// Points farther than this are never reported. In squared units when
    /// `squared_distances` is set.
    pub distance_upper_bound: f64,
    /// Approximation factor: reported distances are within `(1 + eps)` of the exact ones.
    pub eps: f64,
    /// Report squared distances instead of distances.
    pub squared_distances: bool,
    /// Worker threads; `None` uses the global rayon pool.
    pub threads: Option<usize>,
    /// Queries per parallel work item.
    pub chunk_size: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            k: 1,
            distance_upper_bound: f64::INFINITY,
            eps: 0.0,
            squared_distances: false,
            threads: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn distance_upper_bound(mut self, bound: f64) -> Self {
        self.distance_upper_bound = bound;
        self
    }

    pub fn eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn squared_distances(mut self, squared: bool) -> Self {
        self.squared_distances = squared;
        self
    }

    /// Number of worker threads. `1` runs on the calling thread.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(KdTreeError::ZeroNeighbors);
        }
        if !self.eps.is_finite() || self.eps < 0.0 {
            return Err(KdTreeError::InvalidEpsilon(self.eps));
        }
        if !(self.distance_upper_bound >= 0.0) {
            return Err(KdTreeError::InvalidUpperBound(self.distance_upper_bound));
        }
        if self.chunk_size == 0 {
            return Err(KdTreeError::ZeroChunkSize);
        }
        if self.threads == Some(0) {
            return Err(KdTreeError::ZeroThreads);
        }
        Ok(())
    }
}

/// Results of a batch query: `len()` rows of `k` neighbours each, row-major.
///
/// Unfilled slots hold the tree's [`KdTree::missing_index`] with an infinite distance.
#[derive(Clone, Debug, PartialEq)]
pub struct Neighbors {
    indices: Vec<usize>,
    distances: Vec<f64>,
    k: usize,
}

impl Neighbors {
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of queries.
    pub fn len(&self) -> usize {
        self.indices.len() / self.k
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Indices and distances of query `i`.
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let range = i * self.k..(i + 1) * self.k;
        (&self.indices[range.clone()], &self.distances[range])
    }

    pub fn rows(&self) -> impl Iterator<Item = (&[usize], &[f64])> {
        self.indices.chunks_exact(self.k).zip(self.distances.chunks_exact(self.k))
    }

    pub fn into_parts(self) -> (Vec<usize>, Vec<f64>) {
        (self.indices, self.distances)
    }
}

impl KdTree {
    /// Finds the `k` nearest points for every row of the row-major `points`.
    ///
    /// Queries are independent and read-only against the tree, so they are split
    /// into chunks of `options.chunk_size` and processed in parallel. The output
    /// does not depend on the thread count.
    pub fn query(&self, points: &[f64], dims: usize, options: &QueryOptions) -> Result<Neighbors> {
        options.validate()?;
        let m = self.check_queries(points, dims)?;
        let params = SearchParams::new(options);
        let k = params.k;

        let mut indices = vec![self.missing_index(); m * k];
        let mut distances = vec![f64::INFINITY; m * k];

        let threads = match options.threads {
            _ if m <= options.chunk_size => 1,
            Some(t) => t,
            None => rayon::current_num_threads(),
        };
        trace!(
            "dispatching {} queries, k {}, {} threads, chunks of {}",
            m, k, threads, options.chunk_size
        );

        if threads == 1 {
            self.search_chunk(points, &params, &mut Scratch::default(), &mut indices, &mut distances);
        } else if options.threads.is_none() {
            self.search_parallel(points, &params, options.chunk_size, &mut indices, &mut distances);
        } else {
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(|| {
                    self.search_parallel(points, &params, options.chunk_size, &mut indices, &mut distances)
                }),
                Err(err) => {
                    warn!("could not start {} query threads ({}), running sequentially", threads, err);
                    self.search_chunk(points, &params, &mut Scratch::default(), &mut indices, &mut distances);
                }
            }
        }

        Ok(Neighbors { indices, distances, k })
    }

    /// Nearest neighbour of every query with default options.
    pub fn nearest(&self, points: &[f64], dims: usize) -> Result<Neighbors> {
        self.query(points, dims, &QueryOptions::default())
    }

    fn check_queries(&self, points: &[f64], dims: usize) -> Result<usize> {
        if dims != self.dims() {
            return Err(KdTreeError::DimensionMismatch { expected: self.dims(), got: dims });
        }
        if points.len() % dims != 0 {
            return Err(KdTreeError::RaggedCoordinates { len: points.len(), dims });
        }
        if let Some(pos) = points.iter().position(|v| !v.is_finite()) {
            return Err(KdTreeError::NonFiniteQuery { query: pos / dims, axis: pos % dims });
        }
        Ok(points.len() / dims)
    }

    fn search_parallel(
        &self,
        points: &[f64],
        params: &SearchParams,
        chunk_size: usize,
        indices: &mut [usize],
        distances: &mut [f64],
    ) {
        let rows = chunk_size * params.k;
        indices
            .par_chunks_mut(rows)
            .zip(distances.par_chunks_mut(rows))
            .zip(points.par_chunks(chunk_size * self.dims()))
            .for_each_init(Scratch::default, |scratch, ((idx, dist), queries)| {
                self.search_chunk(queries, params, scratch, idx, dist);
            });
    }

    fn search_chunk(
        &self,
        points: &[f64],
        params: &SearchParams,
        scratch: &mut Scratch,
        indices: &mut [usize],
        distances: &mut [f64],
    ) {
        let k = params.k;
        for ((point, idx), dist) in points
            .chunks_exact(self.dims())
            .zip(indices.chunks_exact_mut(k))
            .zip(distances.chunks_exact_mut(k))
        {
            self.search(point, params, scratch, idx, dist);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = QueryOptions::default();
        assert_eq!(options.k, 1);
        assert_eq!(options.distance_upper_bound, f64::INFINITY);
        assert_eq!(options.eps, 0.0);
        assert!(!options.squared_distances);
        assert_eq!(options.threads, None);
        assert_eq!(options.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn validation() {
        assert_eq!(QueryOptions::new().k(0).validate(), Err(KdTreeError::ZeroNeighbors));
        assert_eq!(QueryOptions::new().eps(-0.1).validate(), Err(KdTreeError::InvalidEpsilon(-0.1)));
        assert!(matches!(
            QueryOptions::new().eps(f64::NAN).validate(),
            Err(KdTreeError::InvalidEpsilon(_))
        ));
        assert_eq!(
            QueryOptions::new().distance_upper_bound(-1.0).validate(),
            Err(KdTreeError::InvalidUpperBound(-1.0))
        );
        assert!(matches!(
            QueryOptions::new().distance_upper_bound(f64::NAN).validate(),
            Err(KdTreeError::InvalidUpperBound(_))
        ));
        assert_eq!(QueryOptions::new().chunk_size(0).validate(), Err(KdTreeError::ZeroChunkSize));
        assert_eq!(QueryOptions::new().threads(0).validate(), Err(KdTreeError::ZeroThreads));
        assert!(QueryOptions::new().distance_upper_bound(0.0).validate().is_ok());
    }

    #[test]
    fn batch_shape_and_rows() {
        let tree = KdTree::build(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0], 2, 1, None).unwrap();
        let result = tree
            .query(&[0.9, 0.0, 0.0, 0.8, 0.1, 0.1], 2, &QueryOptions::new().k(2))
            .unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result.k(), 2);
        assert_eq!(result.indices().len(), 6);
        assert_eq!(result.row(0).0[0], 1);
        assert_eq!(result.row(1).0[0], 2);
        assert_eq!(result.row(2).0[0], 0);
        assert_eq!(result.rows().count(), 3);
    }

    #[test]
    fn rejects_mismatched_batches() {
        let tree = KdTree::build(vec![0.0, 0.0], 2, 1, None).unwrap();
        assert_eq!(
            tree.nearest(&[0.0, 0.0, 0.0], 3).unwrap_err(),
            KdTreeError::DimensionMismatch { expected: 2, got: 3 }
        );
        assert_eq!(
            tree.nearest(&[0.0, 0.0, 0.0], 2).unwrap_err(),
            KdTreeError::RaggedCoordinates { len: 3, dims: 2 }
        );
        assert_eq!(
            tree.nearest(&[0.0, 0.0, 0.0, f64::NEG_INFINITY], 2).unwrap_err(),
            KdTreeError::NonFiniteQuery { query: 1, axis: 1 }
        );
    }

    #[test]
    fn empty_batch() {
        let tree = KdTree::build(vec![0.0, 1.0], 1, 1, None).unwrap();
        let result = tree.query(&[], 1, &QueryOptions::new().k(3)).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
    }
}
