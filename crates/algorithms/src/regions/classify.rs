//! Bounding-box region labels
//!
//! A labeling convenience for descriptive tables. No autocorrelation
//! computation depends on it.

use geomoran_core::GeoPoint;
use serde::Serialize;
use std::fmt;

/// Macro-region of a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Americas,
    Sahul,
    Caucasus,
    NonRefugia,
}

impl Region {
    /// All regions, in table order
    pub const ALL: [Region; 4] = [
        Region::Americas,
        Region::Sahul,
        Region::Caucasus,
        Region::NonRefugia,
    ];

    /// Refugia regions only
    pub const REFUGIA: [Region; 3] = [Region::Americas, Region::Sahul, Region::Caucasus];

    pub fn is_refugia(self) -> bool {
        self != Region::NonRefugia
    }

    /// Machine name, e.g. `non_refugia`
    pub fn as_str(self) -> &'static str {
        match self {
            Region::Americas => "americas",
            Region::Sahul => "sahul",
            Region::Caucasus => "caucasus",
            Region::NonRefugia => "non_refugia",
        }
    }

    /// Display label, e.g. `Non-refugia`
    pub fn label(self) -> &'static str {
        match self {
            Region::Americas => "Americas",
            Region::Sahul => "Sahul",
            Region::Caucasus => "Caucasus",
            Region::NonRefugia => "Non-refugia",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label a location.
///
/// - Americas: `lng < -30`
/// - Caucasus: `37 < lat < 45` and `37 < lng < 50`
/// - Sahul: `lng > 110` and `lat < 3`, except that for `-11 < lat < 3`
///   the longitude must exceed 125 (keeps Sulawesi and the Lesser Sundas out)
/// - everything else: non-refugia
///
/// Rules are checked in that order.
pub fn classify(lat: f64, lng: f64) -> Region {
    if lng < -30.0 {
        return Region::Americas;
    }
    if lat > 37.0 && lat < 45.0 && lng > 37.0 && lng < 50.0 {
        return Region::Caucasus;
    }
    if lng > 110.0 && lat < 3.0 {
        if lat > -11.0 && lng <= 125.0 {
            return Region::NonRefugia;
        }
        return Region::Sahul;
    }
    Region::NonRefugia
}

pub fn classify_point(point: &GeoPoint) -> Region {
    classify(point.lat(), point.lng())
}

pub fn is_refugia(lat: f64, lng: f64) -> bool {
    classify(lat, lng).is_refugia()
}
