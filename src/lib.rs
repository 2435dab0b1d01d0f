//! # kdsearch
//!
//! `kdsearch` is a Rust library for nearest-neighbour queries on a fixed set of
//! points in `d`-dimensional space, designed to be used in Rust as well as compiled
//! to WebAssembly (WASM). Points are indexed once in an immutable k-d tree; batches
//! of query points are then answered in parallel.
//!
//! ## Features
//!
//! - **Balanced construction**: recursive median splits along the axis of greatest spread,
//!   with tight bounding boxes on every node for pruning.
//! - **k nearest neighbours**: bounded best-k search with an optional distance upper bound.
//! - **Approximate search**: an `eps` factor trades exactness for fewer node visits.
//! - **Periodic boundaries**: any axis can wrap around at a configured length.
//! - **Parallel batches**: queries are split into chunks and run on a `rayon` pool.
//!   Results are identical for any thread count.
//!
//! ## Example
//!
//! ```
//! use kdsearch::{KdTree, QueryOptions};
//!
//! let points: Vec<f64> = (0..1000).map(|i| i as f64).collect();
//! let tree = KdTree::build(points, 1, 10, None).unwrap();
//!
//! let queries: Vec<f64> = (0..10).map(|i| 400.0 - 10.0 * i as f64).collect();
//! let result = tree.query(&queries, 1, &QueryOptions::new()).unwrap();
//! assert_eq!(result.row(0), (&[400][..], &[0.0][..]));
//! ```
//!
//! ## Main Interface
//!
//! Build a [`KdTree`] with [`KdTree::build`] or [`TreeBuilder`], then query it with
//! [`KdTree::query`] (batches) or [`KdTree::query_point`] (a single point).

mod bounds;
mod builder;
mod error;
mod kdtree;
mod points;
mod query;
mod result_set;
mod traversal;
pub mod wasm;

pub use bounds::BoundingBox;
pub use bounds::Periodicity;
pub use builder::TreeBuilder;
pub use builder::DEFAULT_LEAFSIZE;
pub use error::KdTreeError;
pub use error::Result;
pub use kdtree::KdTree;
pub use kdtree::Node;
pub use kdtree::TreeStats;
pub use points::PointStore;
pub use query::Neighbors;
pub use query::QueryOptions;
pub use query::DEFAULT_CHUNK_SIZE;
pub use result_set::KBest;
pub use result_set::Neighbor;
