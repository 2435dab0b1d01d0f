//! Single-query k-nearest-neighbour search.
//!
//! Depth-first over the node arena with an explicit pending stack. At each split
//! the child on the query's side of the split plane is visited first. A node is
//! skipped when its bounding box is farther than the current threshold of the
//! [`KBest`] set, relaxed by `(1 + eps)`.

use crate::error::{KdTreeError, Result};
use crate::kdtree::{KdTree, Node};
use crate::query::QueryOptions;
use crate::result_set::{KBest, Neighbor};

/// Query parameters resolved once per batch.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SearchParams {
    pub k: usize,
    pub bound_sq: f64,
    /// `(1 + eps)²`; box distances are scaled by this before pruning.
    pub eps_scale: f64,
    pub squared: bool,
}

impl SearchParams {
    pub fn new(options: &QueryOptions) -> Self {
        let bound = options.distance_upper_bound;
        let bound_sq = if options.squared_distances { bound } else { bound * bound };
        let relax = 1.0 + options.eps;
        Self {
            k: options.k,
            bound_sq,
            eps_scale: relax * relax,
            squared: options.squared_distances,
        }
    }
}

/// Per-thread working memory, reused across the queries of a chunk.
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    stack: Vec<(usize, f64)>,
    best: KBest,
}

impl KdTree {
    /// Finds the `options.k` nearest points to a single `point`.
    ///
    /// Always returns exactly `k` entries in ascending distance. Slots that could
    /// not be filled, because the tree holds fewer than `k` points or the rest lie
    /// beyond the distance upper bound, carry [`KdTree::missing_index`] and an
    /// infinite distance.
    pub fn query_point(&self, point: &[f64], options: &QueryOptions) -> Result<Vec<Neighbor>> {
        options.validate()?;
        if point.len() != self.dims() {
            return Err(KdTreeError::DimensionMismatch {
                expected: self.dims(),
                got: point.len(),
            });
        }
        if let Some(axis) = point.iter().position(|v| !v.is_finite()) {
            return Err(KdTreeError::NonFiniteQuery { query: 0, axis });
        }

        let params = SearchParams::new(options);
        let mut scratch = Scratch::default();
        let mut indices = vec![0; params.k];
        let mut distances = vec![0.0; params.k];
        self.search(point, &params, &mut scratch, &mut indices, &mut distances);

        Ok(indices
            .into_iter()
            .zip(distances)
            .map(|(index, distance)| Neighbor { index, distance })
            .collect())
    }

    /// Runs one query and writes its `k` results into the output row slices.
    pub(crate) fn search(
        &self,
        point: &[f64],
        params: &SearchParams,
        scratch: &mut Scratch,
        indices: &mut [usize],
        distances: &mut [f64],
    ) {
        let Scratch { stack, best } = scratch;
        best.reset(params.k, params.bound_sq);
        stack.clear();

        if !self.is_empty() {
            let root_dist = self.box_dist_sq(point, Self::ROOT);
            if !(root_dist * params.eps_scale > best.threshold()) {
                stack.push((Self::ROOT, root_dist));
            }
        }

        while let Some((node, box_dist)) = stack.pop() {
            // The threshold may have shrunk since this node was pushed.
            if box_dist * params.eps_scale > best.threshold() {
                continue;
            }

            match self.nodes[node] {
                Node::Leaf { start, count } => {
                    for &index in &self.permutation[start..start + count] {
                        best.offer(index, self.store.dist_sq(index, point));
                    }
                }
                Node::Split { axis, split, left, right } => {
                    let (near, far) = if point[axis] < split { (left, right) } else { (right, left) };
                    let threshold = best.threshold();

                    // Pushed first so it is popped after the near side.
                    let far_dist = self.box_dist_sq(point, far);
                    if !(far_dist * params.eps_scale > threshold) {
                        stack.push((far, far_dist));
                    }
                    let near_dist = self.box_dist_sq(point, near);
                    if !(near_dist * params.eps_scale > threshold) {
                        stack.push((near, near_dist));
                    }
                }
            }
        }

        best.drain_into(indices, distances, self.missing_index());
        if !params.squared {
            for d in distances.iter_mut() {
                *d = d.sqrt();
            }
        }
    }

    #[inline]
    fn box_dist_sq(&self, point: &[f64], node: usize) -> f64 {
        let (min, max) = self.node_box(node);
        self.store.box_dist_sq(point, min, max)
    }
}
