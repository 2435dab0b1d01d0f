//! Median-split construction of the flat node arena.

use crate::bounds::Periodicity;
use crate::error::{KdTreeError, Result};
use crate::kdtree::{KdTree, Node};
use crate::points::PointStore;
use log::{debug, log_enabled, Level};

/// Maximum number of points per leaf unless configured otherwise.
pub const DEFAULT_LEAFSIZE: usize = 16;

/// Configuration for building a [`KdTree`].
///
/// ```
/// use kdsearch::TreeBuilder;
///
/// let coords = vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
/// let tree = TreeBuilder::new().leafsize(1).build(coords, 2).unwrap();
/// assert_eq!(tree.len(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct TreeBuilder {
    leafsize: usize,
    periodic: Option<Vec<f64>>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self {
            leafsize: DEFAULT_LEAFSIZE,
            periodic: None,
        }
    }
}

// Range of the permutation still to be turned into the node at `node`.
struct Pending {
    node: usize,
    start: usize,
    end: usize,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of points in a leaf. Must be at least 1.
    pub fn leafsize(mut self, leafsize: usize) -> Self {
        self.leafsize = leafsize;
        self
    }

    /// Wrap length per axis; `0` leaves an axis unwrapped.
    pub fn periodic(mut self, lengths: &[f64]) -> Self {
        self.periodic = Some(lengths.to_vec());
        self
    }

    /// Validates the row-major `coords` and builds the tree.
    pub fn build(&self, coords: Vec<f64>, dims: usize) -> Result<KdTree> {
        if self.leafsize == 0 {
            return Err(KdTreeError::ZeroLeafSize);
        }
        let store = match &self.periodic {
            Some(lengths) => PointStore::with_periodic_lengths(coords, dims, lengths)?,
            None => PointStore::new(coords, dims)?,
        };
        self.build_store(store)
    }

    /// Builds the tree over an already validated store.
    ///
    /// Periodic lengths configured on the builder replace those of the store.
    pub fn build_store(&self, store: PointStore) -> Result<KdTree> {
        if self.leafsize == 0 {
            return Err(KdTreeError::ZeroLeafSize);
        }
        let store = match &self.periodic {
            Some(lengths) => {
                let dims = store.dims();
                let periodicity = Periodicity::new(lengths, dims)?;
                PointStore::with_periodicity(store.into_coords(), dims, periodicity)?
            }
            None => store,
        };

        let tree = construct(store, self.leafsize);
        if log_enabled!(Level::Debug) {
            let stats = tree.stats();
            debug!(
                "built kd-tree: {} points, {} dims, leafsize {}, {} nodes, depth {}",
                tree.len(),
                tree.dims(),
                tree.leafsize,
                stats.nodes,
                stats.depth
            );
        }
        Ok(tree)
    }
}

impl KdTree {
    /// Builds a tree from row-major `coords` with `dims` values per point.
    ///
    /// Shorthand for [`TreeBuilder`] with the given leafsize and optional periodic lengths.
    pub fn build(coords: Vec<f64>, dims: usize, leafsize: usize, periodic: Option<&[f64]>) -> Result<KdTree> {
        let mut builder = TreeBuilder::new().leafsize(leafsize);
        if let Some(lengths) = periodic {
            builder = builder.periodic(lengths);
        }
        builder.build(coords, dims)
    }
}

fn construct(store: PointStore, leafsize: usize) -> KdTree {
    let n = store.len();
    let d = store.dims();
    let mut permutation: Vec<usize> = (0..n).collect();

    if n == 0 {
        let mut boxes = vec![f64::INFINITY; d];
        boxes.extend(std::iter::repeat(f64::NEG_INFINITY).take(d));
        return KdTree {
            store,
            nodes: vec![Node::Leaf { start: 0, count: 0 }],
            boxes,
            permutation,
            leafsize,
        };
    }

    // A balanced tree has about 2 * n / leafsize nodes.
    let capacity = 2 * n.div_ceil(leafsize);
    let mut nodes = Vec::with_capacity(capacity);
    let mut boxes = Vec::with_capacity(capacity * 2 * d);
    push_placeholder(&mut nodes, &mut boxes, d);

    let mut stack = vec![Pending { node: KdTree::ROOT, start: 0, end: n }];
    let mut min = vec![0.0; d];
    let mut max = vec![0.0; d];

    while let Some(Pending { node, start, end }) = stack.pop() {
        let count = end - start;
        range_bounds(&store, &permutation[start..end], &mut min, &mut max);
        let offset = node * 2 * d;
        boxes[offset..offset + d].copy_from_slice(&min);
        boxes[offset + d..offset + 2 * d].copy_from_slice(&max);

        if count <= leafsize {
            nodes[node] = Node::Leaf { start, count };
            continue;
        }

        // Widest axis; the lowest axis index wins ties.
        let mut axis = 0;
        let mut spread = max[0] - min[0];
        for j in 1..d {
            if max[j] - min[j] > spread {
                axis = j;
                spread = max[j] - min[j];
            }
        }

        let mid = count / 2;
        if mid == 0 || mid == count {
            nodes[node] = Node::Leaf { start, count };
            continue;
        }

        // Coordinates are finite, so (coordinate, index) is a strict total order and
        // the partition is the same on every run.
        permutation[start..end].select_nth_unstable_by(mid, |&a, &b| {
            store
                .coord(a, axis)
                .total_cmp(&store.coord(b, axis))
                .then(a.cmp(&b))
        });
        let split = store.coord(permutation[start + mid], axis);

        let left = nodes.len();
        push_placeholder(&mut nodes, &mut boxes, d);
        let right = nodes.len();
        push_placeholder(&mut nodes, &mut boxes, d);
        nodes[node] = Node::Split { axis, split, left, right };

        stack.push(Pending { node: right, start: start + mid, end });
        stack.push(Pending { node: left, start, end: start + mid });
    }

    KdTree {
        store,
        nodes,
        boxes,
        permutation,
        leafsize,
    }
}

fn push_placeholder(nodes: &mut Vec<Node>, boxes: &mut Vec<f64>, d: usize) {
    nodes.push(Node::Leaf { start: 0, count: 0 });
    boxes.resize(boxes.len() + 2 * d, 0.0);
}

fn range_bounds(store: &PointStore, indices: &[usize], min: &mut [f64], max: &mut [f64]) {
    min.copy_from_slice(store.point(indices[0]));
    max.copy_from_slice(store.point(indices[0]));
    for &i in &indices[1..] {
        for (j, &v) in store.point(i).iter().enumerate() {
            if v < min[j] {
                min[j] = v;
            } else if v > max[j] {
                max[j] = v;
            }
        }
    }
}
