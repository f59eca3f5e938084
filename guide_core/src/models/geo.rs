//! Coordinates, map regions and location fixes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and within the geographic ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Planar distance in degrees. Good enough at city scale.
    pub fn planar_distance(&self, other: &Coordinates) -> f64 {
        let dlat = self.latitude - other.latitude;
        let dlon = self.longitude - other.longitude;
        (dlat * dlat + dlon * dlon).sqrt()
    }
}

/// A map camera target: center plus latitude/longitude spans.
///
/// Both deltas are strictly positive for any region built through
/// [`MapRegion::new`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRegion {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl MapRegion {
    /// Returns `None` unless both deltas are finite and > 0.
    pub fn new(center: Coordinates, latitude_delta: f64, longitude_delta: f64) -> Option<Self> {
        let positive = |d: f64| d.is_finite() && d > 0.0;
        if !center.is_valid() || !positive(latitude_delta) || !positive(longitude_delta) {
            return None;
        }
        Some(Self {
            latitude: center.latitude,
            longitude: center.longitude,
            latitude_delta,
            longitude_delta,
        })
    }

    pub fn center(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn contains(&self, point: &Coordinates) -> bool {
        (point.latitude - self.latitude).abs() <= self.latitude_delta / 2.0
            && (point.longitude - self.longitude).abs() <= self.longitude_delta / 2.0
    }
}

/// Why the resolver substituted the city anchor for a device fix.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    PermissionDenied,
    PositionUnavailable,
    OutsideServiceArea,
}

/// Where a [`LocationFix`] came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum FixSource {
    Device,
    Fallback(FallbackReason),
}

/// One resolved position.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub coordinates: Coordinates,
    pub timestamp: DateTime<Utc>,
    pub source: FixSource,
}

impl LocationFix {
    pub fn device(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            timestamp: Utc::now(),
            source: FixSource::Device,
        }
    }

    pub fn fallback(anchor: Coordinates, reason: FallbackReason) -> Self {
        Self {
            coordinates: anchor,
            timestamp: Utc::now(),
            source: FixSource::Fallback(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, FixSource::Fallback(_))
    }
}
