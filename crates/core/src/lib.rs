//! # geomoran Core
//!
//! Core types, traits and I/O for the geomoran spatial statistics library.
//!
//! This crate provides:
//! - `GeoPoint` / `PointSet`: validated, index-stable point locations on the sphere
//! - `Site` / `FeatureDataset`: points with category metadata
//! - `SpatialWeights`: square, zero-diagonal, read-only weights matrix
//! - Algorithm traits for consistent API
//! - I/O for WALS feature exports

pub mod error;
pub mod io;
pub mod point;
pub mod weights;

pub use error::{Error, Result};
pub use point::{FeatureDataset, GeoPoint, PointSet, Site};
pub use weights::SpatialWeights;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::point::{FeatureDataset, GeoPoint, PointSet, Site};
    pub use crate::weights::SpatialWeights;
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in geomoran.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(
        &self,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
