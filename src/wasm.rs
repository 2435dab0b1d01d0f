use crate::kdtree::KdTree;
use crate::query::QueryOptions;
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

/// A k-d tree over a flat array of points, for use from JavaScript.
#[wasm_bindgen(js_name = KdTree)]
pub struct KdTreeWasm {
    inner: KdTree,
}

#[wasm_bindgen(js_class = KdTree)]
impl KdTreeWasm {
    /// Builds the tree.
    ///
    /// # Arguments
    ///
    /// * `points` - A flat array of coordinates `[x, y, .., x, y, ..]`.
    /// * `dims` - Number of coordinates per point.
    /// * `leafsize` - Maximum number of points per leaf.
    /// * `periodic` - Optional wrap length per axis, `0` for axes that do not wrap.
    #[wasm_bindgen(constructor)]
    pub fn new(points: &[f64], dims: usize, leafsize: usize, periodic: Option<Vec<f64>>) -> Result<KdTreeWasm, JsError> {
        let inner = KdTree::build(points.to_vec(), dims, leafsize, periodic.as_deref())?;
        Ok(KdTreeWasm { inner })
    }

    #[wasm_bindgen(getter)]
    pub fn count(&self) -> usize {
        self.inner.len()
    }

    #[wasm_bindgen(getter)]
    pub fn dims(&self) -> usize {
        self.inner.dims()
    }

    /// Queries the `k` nearest points for every point in the flat `points` array.
    ///
    /// Missing neighbours are reported with index `count` and an infinite distance.
    pub fn query(
        &self,
        points: &[f64],
        k: usize,
        distance_upper_bound: Option<f64>,
        eps: Option<f64>,
        squared_distances: Option<bool>,
    ) -> Result<NeighborsWasm, JsError> {
        let options = QueryOptions::new()
            .k(k)
            .distance_upper_bound(distance_upper_bound.unwrap_or(f64::INFINITY))
            .eps(eps.unwrap_or(0.0))
            .squared_distances(squared_distances.unwrap_or(false));
        let result = self.inner.query(points, self.inner.dims(), &options)?;
        Ok(NeighborsWasm::from_parts(result.k(), result.into_parts()))
    }
}

/// Flat `count x k` neighbour arrays returned to JavaScript.
#[wasm_bindgen(js_name = Neighbors)]
pub struct NeighborsWasm {
    indices: Vec<u32>,
    distances: Vec<f64>,
    k: usize,
}

impl NeighborsWasm {
    fn from_parts(k: usize, (indices, distances): (Vec<usize>, Vec<f64>)) -> Self {
        NeighborsWasm {
            indices: indices.into_iter().map(|i| i as u32).collect(),
            distances,
            k,
        }
    }
}

#[wasm_bindgen(js_class = Neighbors)]
impl NeighborsWasm {
    #[wasm_bindgen(getter)]
    pub fn k(&self) -> usize {
        self.k
    }

    #[wasm_bindgen(getter)]
    pub fn indices(&self) -> Vec<u32> {
        self.indices.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn distances(&self) -> Vec<f64> {
        self.distances.clone()
    }
}
