//! Spatial structure on the sphere
//!
//! - **distance**: haversine great-circle distance
//! - **knn**: row-standardized k-nearest-neighbor weights

pub mod distance;
mod knn;

pub use distance::{haversine, haversine_km, EARTH_RADIUS_KM};
pub use knn::{knn_weights, KnnWeights, KnnWeightsParams, WeightScheme, MIN_DISTANCE_KM};
