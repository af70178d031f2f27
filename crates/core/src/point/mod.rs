//! Point data on the sphere
//!
//! - `GeoPoint`: validated latitude/longitude pair in degrees
//! - `PointSet`: ordered, index-stable sequence of points
//! - `Site` / `FeatureDataset`: points with code, name and category metadata

mod site;

pub use site::{FeatureDataset, Site};

use crate::error::{Error, Result};
use serde::Serialize;

/// A location on the sphere, in decimal degrees.
///
/// Latitude is within `-90..=90` and longitude within `-180..=180`.
/// Both are checked on construction and the point is immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    /// Create a point, rejecting coordinates outside the valid range (and NaN).
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(Error::CoordinateOutOfRange { lat, lng });
        }
        Ok(Self { lat, lng })
    }

    /// Latitude in degrees
    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees
    #[inline]
    pub fn lng(&self) -> f64 {
        self.lng
    }
}

/// An ordered set of points with a fixed index.
///
/// Index order is part of the data: neighbor tie-breaks and therefore every
/// downstream result depend on it, so nothing in the crate reorders a set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    points: Vec<GeoPoint>,
}

impl PointSet {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    /// Build a set from raw `(lat, lng)` pairs, validating each one.
    pub fn from_coords(coords: &[(f64, f64)]) -> Result<Self> {
        let points = coords
            .iter()
            .map(|&(lat, lng)| GeoPoint::new(lat, lng))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GeoPoint> {
        self.points.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeoPoint> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[GeoPoint] {
        &self.points
    }
}

impl FromIterator<GeoPoint> for PointSet {
    fn from_iter<I: IntoIterator<Item = GeoPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a GeoPoint;
    type IntoIter = std::slice::Iter<'a, GeoPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
