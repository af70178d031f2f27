//! Observation sites and feature datasets

use super::{GeoPoint, PointSet};
use serde::Serialize;

/// A single observed location with its category for one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Site {
    /// Short identifier (e.g. a WALS language code)
    pub code: String,
    /// Display name
    pub name: String,
    pub point: GeoPoint,
    /// Category the site falls into for this feature
    pub value: i64,
    /// Human-readable label of `value`
    pub description: String,
}

/// All sites recorded for one feature, in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureDataset {
    pub id: String,
    pub name: String,
    pub sites: Vec<Site>,
}

impl FeatureDataset {
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Point locations in site order.
    pub fn point_set(&self) -> PointSet {
        self.sites.iter().map(|s| s.point).collect()
    }

    /// Sites whose category is one of `targets`.
    pub fn target_sites(&self, targets: &[i64]) -> Vec<&Site> {
        self.sites
            .iter()
            .filter(|s| targets.contains(&s.value))
            .collect()
    }

    /// 0/1 indicator of target membership, aligned with [`Self::point_set`].
    pub fn indicator(&self, targets: &[i64]) -> Vec<f64> {
        self.sites
            .iter()
            .map(|s| if targets.contains(&s.value) { 1.0 } else { 0.0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(code: &str, lat: f64, lng: f64, value: i64) -> Site {
        Site {
            code: code.into(),
            name: code.to_uppercase(),
            point: GeoPoint::new(lat, lng).unwrap(),
            value,
            description: String::new(),
        }
    }

    #[test]
    fn test_indicator_alignment() {
        let ds = FeatureDataset {
            id: "18A".into(),
            name: "Absence of Common Consonants".into(),
            sites: vec![
                site("a", 0.0, 0.0, 2),
                site("b", 1.0, 1.0, 5),
                site("c", 2.0, 2.0, 1),
            ],
        };
        assert_eq!(ds.indicator(&[2, 5]), vec![1.0, 1.0, 0.0]);
        assert_eq!(ds.target_sites(&[1]).len(), 1);
        assert_eq!(ds.point_set().len(), 3);
        assert_eq!(ds.point_set().get(2).unwrap().lat(), 2.0);
    }
}
