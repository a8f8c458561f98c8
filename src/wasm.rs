//! JavaScript bindings.
//!
//! `KdTree64` and `KdTree32` expose build and batch queries over flat typed
//! arrays. Results come back flattened, `k` entries per query point.

use crate::config::BuildConfig;
use crate::error::QueryError;
use crate::float::Coord;
use crate::kdtree::KdTree;
use crate::query::{DecomposedNeighbor, Neighbor};
use js_sys::Array;
use thiserror::Error;
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

/// Reads the first `dim` numbers of a JS array.
pub fn parse_js_point(val: &JsValue, dim: usize) -> Option<Vec<f64>> {
    let arr = val.dyn_ref::<Array>()?;
    if arr.length() < dim as u32 {
        return None;
    }
    (0..dim).map(|i| arr.get(i as u32).as_f64()).collect()
}

fn flatten<T: Copy>(results: Vec<Vec<Neighbor<T>>>) -> (Vec<T>, Vec<u32>) {
    let n = results.iter().map(Vec::len).sum();
    let mut distances = Vec::with_capacity(n);
    let mut indices = Vec::with_capacity(n);
    for neighbor in results.into_iter().flatten() {
        distances.push(neighbor.distance);
        indices.push(neighbor.index as u32);
    }
    (distances, indices)
}

fn flatten_decomposed<T: Copy>(results: Vec<Vec<DecomposedNeighbor<T>>>) -> (Vec<T>, Vec<T>, Vec<u32>) {
    let n = results.iter().map(Vec::len).sum();
    let mut parallel = Vec::with_capacity(n);
    let mut transverse = Vec::with_capacity(n);
    let mut indices = Vec::with_capacity(n);
    for neighbor in results.into_iter().flatten() {
        parallel.push(neighbor.parallel);
        transverse.push(neighbor.transverse);
        indices.push(neighbor.index as u32);
    }
    (parallel, transverse, indices)
}

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// Why a single-point lookup from JS failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NearestError {
    #[error("expected an array of at least {dim} numbers")]
    Parse { dim: usize },

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Original index of the point nearest to an already parsed JS point.
fn nearest_index<T: Coord>(tree: &KdTree<T>, point: Option<Vec<T>>) -> Result<u32, NearestError> {
    let point = point.ok_or(NearestError::Parse { dim: tree.dim() })?;
    Ok(tree.query_nearest(&point)?.index as u32)
}

macro_rules! wasm_tree {
    ($tree:ident, $result:ident, $decomposed:ident, $t:ty) => {
        /// Flattened neighbor distances and indices, `k` per query.
        #[wasm_bindgen]
        pub struct $result {
            distances: Vec<$t>,
            indices: Vec<u32>,
        }

        #[wasm_bindgen]
        impl $result {
            #[wasm_bindgen(getter)]
            pub fn distances(&self) -> Vec<$t> {
                self.distances.clone()
            }

            #[wasm_bindgen(getter)]
            pub fn indices(&self) -> Vec<u32> {
                self.indices.clone()
            }
        }

        /// Flattened parallel and transverse components and indices, `k` per query.
        #[wasm_bindgen]
        pub struct $decomposed {
            parallel: Vec<$t>,
            transverse: Vec<$t>,
            indices: Vec<u32>,
        }

        #[wasm_bindgen]
        impl $decomposed {
            #[wasm_bindgen(getter)]
            pub fn parallel(&self) -> Vec<$t> {
                self.parallel.clone()
            }

            #[wasm_bindgen(getter)]
            pub fn transverse(&self) -> Vec<$t> {
                self.transverse.clone()
            }

            #[wasm_bindgen(getter)]
            pub fn indices(&self) -> Vec<u32> {
                self.indices.clone()
            }
        }

        #[wasm_bindgen]
        pub struct $tree {
            inner: KdTree<$t>,
        }

        #[wasm_bindgen]
        impl $tree {
            /// Builds a tree over a flat coordinate array.
            ///
            /// # Arguments
            ///
            /// * `points` - Flat coordinates `[x, y, z, x, y, z, ...]`.
            /// * `dim` - Number of axes per point.
            /// * `leafsize` - Maximum points per leaf.
            /// * `par_split_level` - Depth above which the build forks across threads.
            /// * `periods` - Optional per-axis period for periodic boundaries.
            #[wasm_bindgen(constructor)]
            pub fn new(
                points: &[$t],
                dim: usize,
                leafsize: usize,
                par_split_level: usize,
                periods: Option<Vec<$t>>,
            ) -> Result<$tree, JsError> {
                let config = BuildConfig::new(leafsize, par_split_level);
                let inner = KdTree::build(points, dim, &config, periods.as_deref()).map_err(js_err)?;
                Ok($tree { inner })
            }

            #[wasm_bindgen(getter)]
            pub fn count(&self) -> usize {
                self.inner.len()
            }

            #[wasm_bindgen(getter)]
            pub fn dim(&self) -> usize {
                self.inner.dim()
            }

            #[wasm_bindgen(getter)]
            pub fn height(&self) -> usize {
                self.inner.height()
            }

            /// The `k` nearest neighbors of every point in `queries`.
            pub fn query(&self, queries: &[$t], k: usize) -> Result<$result, JsError> {
                let (distances, indices) = flatten(self.inner.query_batch(queries, k).map_err(js_err)?);
                Ok($result { distances, indices })
            }

            /// Like `query`, with distances split along `axis` and across it.
            #[wasm_bindgen(js_name = queryDecomposed)]
            pub fn query_decomposed(&self, queries: &[$t], k: usize, axis: usize) -> Result<$decomposed, JsError> {
                let results = self.inner.query_batch_decomposed(queries, k, axis).map_err(js_err)?;
                let (parallel, transverse, indices) = flatten_decomposed(results);
                Ok($decomposed {
                    parallel,
                    transverse,
                    indices,
                })
            }

            /// Index of the point nearest to a JS array `[x, y, z]`.
            pub fn nearest(&self, val: JsValue) -> Result<u32, JsError> {
                let point = parse_js_point(&val, self.inner.dim())
                    .map(|p| p.into_iter().map(|v| v as $t).collect());
                nearest_index(&self.inner, point).map_err(js_err)
            }
        }
    };
}

wasm_tree!(KdTree64, QueryResult64, DecomposedResult64, f64);
wasm_tree!(KdTree32, QueryResult32, DecomposedResult32, f32);
