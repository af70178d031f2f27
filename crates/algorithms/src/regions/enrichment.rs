//! Baseline and enrichment of refugia membership
//!
//! Counts locations per region for a whole sample (the baseline) and for
//! a subset carrying some trait, then compares the refugia share of the two.

use super::classify::{classify_point, Region};
use geomoran_core::{FeatureDataset, GeoPoint, Site};
use serde::Serialize;
use std::collections::HashSet;

/// Number of locations in each region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegionCounts {
    pub americas: usize,
    pub sahul: usize,
    pub caucasus: usize,
    pub non_refugia: usize,
}

impl RegionCounts {
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a GeoPoint>,
    {
        let mut counts = Self::default();
        for p in points {
            *counts.get_mut(classify_point(p)) += 1;
        }
        counts
    }

    pub fn get(&self, region: Region) -> usize {
        match region {
            Region::Americas => self.americas,
            Region::Sahul => self.sahul,
            Region::Caucasus => self.caucasus,
            Region::NonRefugia => self.non_refugia,
        }
    }

    fn get_mut(&mut self, region: Region) -> &mut usize {
        match region {
            Region::Americas => &mut self.americas,
            Region::Sahul => &mut self.sahul,
            Region::Caucasus => &mut self.caucasus,
            Region::NonRefugia => &mut self.non_refugia,
        }
    }

    pub fn total(&self) -> usize {
        Region::ALL.iter().map(|&r| self.get(r)).sum()
    }

    pub fn refugia_total(&self) -> usize {
        Region::REFUGIA.iter().map(|&r| self.get(r)).sum()
    }

    /// Share of `region` in percent; 0 for an empty sample
    pub fn percentage(&self, region: Region) -> f64 {
        percent(self.get(region), self.total())
    }

    /// Share of all refugia regions in percent; 0 for an empty sample
    pub fn refugia_percentage(&self) -> f64 {
        percent(self.refugia_total(), self.total())
    }
}

/// Regional distribution of a full sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Baseline {
    pub counts: RegionCounts,
    pub total: usize,
    pub refugia_total: usize,
    pub refugia_percentage: f64,
}

/// Regional distribution of a trait subset relative to a baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Enrichment {
    pub counts: RegionCounts,
    pub total: usize,
    pub refugia_total: usize,
    pub refugia_percentage: f64,
    pub non_refugia_percentage: f64,
    /// Subset refugia share over baseline refugia share; 0 if the baseline share is 0
    pub enrichment_factor: f64,
}

pub fn baseline<'a, I>(points: I) -> Baseline
where
    I: IntoIterator<Item = &'a GeoPoint>,
{
    let counts = RegionCounts::from_points(points);
    Baseline {
        counts,
        total: counts.total(),
        refugia_total: counts.refugia_total(),
        refugia_percentage: counts.refugia_percentage(),
    }
}

pub fn enrichment<'a, I>(points: I, baseline_refugia_percentage: f64) -> Enrichment
where
    I: IntoIterator<Item = &'a GeoPoint>,
{
    let counts = RegionCounts::from_points(points);
    let refugia_percentage = counts.refugia_percentage();
    let enrichment_factor = if baseline_refugia_percentage > 0.0 {
        refugia_percentage / baseline_refugia_percentage
    } else {
        0.0
    };
    Enrichment {
        counts,
        total: counts.total(),
        refugia_total: counts.refugia_total(),
        refugia_percentage,
        non_refugia_percentage: 100.0 - refugia_percentage,
        enrichment_factor,
    }
}

/// Unique sites across several datasets.
///
/// Two sites are the same when they share a code and their coordinates
/// agree to two decimal places. The first occurrence wins and dataset
/// order is kept.
pub fn dedup_sites(datasets: &[FeatureDataset]) -> Vec<&Site> {
    let mut seen = HashSet::new();
    datasets
        .iter()
        .flat_map(|ds| ds.sites.iter())
        .filter(|&s| {
            seen.insert((
                s.code.as_str(),
                round2(s.point.lat()),
                round2(s.point.lng()),
            ))
        })
        .collect()
}

fn round2(v: f64) -> i64 {
    (v * 100.0).round() as i64
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}
