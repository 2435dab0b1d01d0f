use crate::bounds::BoundingBox;
use crate::points::PointStore;
use std::fmt;

/// A node of the flat tree arena. Children are referenced by index into
/// [`KdTree::nodes`], and leaves reference a contiguous range of
/// [`KdTree::permutation`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Node {
    Split {
        axis: usize,
        split: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        start: usize,
        count: usize,
    },
}

/// Shape summary of a built tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes: usize,
    pub leaves: usize,
    /// Number of nodes on the longest root-to-leaf path.
    pub depth: usize,
    /// Size of the fullest leaf.
    pub max_leaf: usize,
}

/// Immutable k-d tree over a [`PointStore`].
///
/// Built by [`crate::TreeBuilder`]; queried through [`KdTree::query`] and
/// [`KdTree::query_point`]. The tree is never mutated after construction, so a
/// shared reference can be used from any number of threads.
#[derive(Clone, Debug)]
pub struct KdTree {
    pub(crate) store: PointStore,
    pub(crate) nodes: Vec<Node>,
    // Per node: `dims` minima followed by `dims` maxima.
    pub(crate) boxes: Vec<f64>,
    pub(crate) permutation: Vec<usize>,
    pub(crate) leafsize: usize,
}

impl KdTree {
    /// Index of the root node. The builder always places it first.
    pub const ROOT: usize = 0;

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.store.dims()
    }

    pub fn leafsize(&self) -> usize {
        self.leafsize
    }

    pub fn points(&self) -> &PointStore {
        &self.store
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn root(&self) -> usize {
        Self::ROOT
    }

    /// Point indices in leaf order. Every index in `0..len()` appears exactly once.
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Index reported for neighbour slots that could not be filled.
    ///
    /// Equal to the number of indexed points, one past the last valid index.
    /// Its paired distance is always `f64::INFINITY`.
    pub fn missing_index(&self) -> usize {
        self.len()
    }

    /// Tight bounding box of all indexed points, or `None` for an empty tree.
    pub fn bounds(&self) -> Option<BoundingBox> {
        if self.is_empty() {
            return None;
        }
        Some(self.node_bounds(Self::ROOT))
    }

    /// Tight bounding box of the points beneath `node`.
    pub fn node_bounds(&self, node: usize) -> BoundingBox {
        let (min, max) = self.node_box(node);
        BoundingBox::new(min.to_vec(), max.to_vec())
    }

    #[inline]
    pub(crate) fn node_box(&self, node: usize) -> (&[f64], &[f64]) {
        let d = self.dims();
        let start = node * 2 * d;
        (&self.boxes[start..start + d], &self.boxes[start + d..start + 2 * d])
    }

    /// Point indices held by a leaf node; empty for split nodes.
    pub fn leaf_points(&self, node: usize) -> &[usize] {
        match self.nodes[node] {
            Node::Leaf { start, count } => &self.permutation[start..start + count],
            Node::Split { .. } => &[],
        }
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            nodes: self.nodes.len(),
            ..TreeStats::default()
        };
        let mut stack = vec![(Self::ROOT, 1)];
        while let Some((node, depth)) = stack.pop() {
            stats.depth = stats.depth.max(depth);
            match self.nodes[node] {
                Node::Leaf { count, .. } => {
                    stats.leaves += 1;
                    stats.max_leaf = stats.max_leaf.max(count);
                }
                Node::Split { left, right, .. } => {
                    stack.push((right, depth + 1));
                    stack.push((left, depth + 1));
                }
            }
        }
        stats
    }
}

/// Indented dump of the node hierarchy, one node per line.
impl fmt::Display for KdTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(Self::ROOT, 0usize)];
        while let Some((node, level)) = stack.pop() {
            write!(f, "{:width$}", "", width = level)?;
            match self.nodes[node] {
                Node::Split { axis, split, left, right } => {
                    writeln!(f, "(split: {}, axis: {})", split, axis)?;
                    stack.push((right, level + 1));
                    stack.push((left, level + 1));
                }
                Node::Leaf { start, count } => {
                    writeln!(f, "(leaf: {}..{})", start, start + count)?;
                }
            }
        }
        Ok(())
    }
}
