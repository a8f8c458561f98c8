//! # kdtorus
//!
//! `kdtorus` is an exact k-nearest-neighbor kd-tree for point sets of any
//! dimensionality, with optional periodic (toroidal) boundaries. It can be
//! used from Rust as well as compiled to WebAssembly (WASM).
//!
//! ## Features
//!
//! - **Exact k-NN**: branch-and-bound search over a balanced median-split tree.
//! - **Periodic boundaries**: minimum-image distances on a per-axis periodic box.
//! - **Parallel build**: the top `par_split_level` levels of the tree are built with `rayon::join`,
//!   producing exactly the tree a sequential build would.
//! - **Batched queries**: query point sets are searched in parallel, results follow input order.
//! - **Axis decomposition**: neighbor displacements reported along an axis and across it.
//! - **Single or double precision**: `f32` and `f64` coordinates.
//!
//! ## Example
//!
//! ```
//! use kdtorus::{BuildConfig, KdTree};
//!
//! let points: [f64; 9] = [0.1, 0.1, 0.1, 0.9, 0.5, 0.5, 0.999, 0.5, 0.5];
//! let config = BuildConfig::default().with_leafsize(2);
//! let tree = KdTree::build(&points, 3, &config, Some(&[1.0, 1.0, 1.0][..])).unwrap();
//!
//! let nearest = tree.query_nearest(&[0.001, 0.5, 0.5]).unwrap();
//! assert_eq!(nearest.index, 2);
//! assert!((nearest.distance - 0.002).abs() < 1e-9);
//! ```
//!
//! ## Main Interface
//!
//! The primary entry point is the [`KdTree`] struct. [`Index`] wraps either
//! precision for callers holding runtime-typed buffers.

mod bounds;
mod build;
mod candidates;
mod config;
mod error;
mod float;
mod index;
mod kdtree;
mod metric;
mod partition;
mod query;
pub mod wasm;

pub use bounds::BoundingBox;
pub use config::BuildConfig;
pub use config::SplitRule;
pub use error::BuildError;
pub use error::QueryError;
pub use float::Coord;
pub use float::Precision;
pub use index::AnyNeighbors;
pub use index::Coords;
pub use index::Index;
pub use index::Neighbors;
pub use kdtree::KdTree;
pub use metric::Metric;
pub use query::DecomposedNeighbor;
pub use query::KnnScratch;
pub use query::NearestNeighbors;
pub use query::Neighbor;
