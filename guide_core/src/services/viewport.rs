//! Viewport fitter.
//!
//! Computes the map region that frames a set of coordinates. Unusable points
//! (missing, non-finite or out of range) are skipped rather than failing the
//! whole fit.

use tracing::debug;

use crate::config::{ConfigError, GuideConfig};
use crate::models::{Coordinates, MapRegion};

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    fn around(point: Coordinates) -> Self {
        Self {
            south: point.latitude,
            west: point.longitude,
            north: point.latitude,
            east: point.longitude,
        }
    }

    fn extend(&mut self, point: Coordinates) {
        self.south = self.south.min(point.latitude);
        self.north = self.north.max(point.latitude);
        self.west = self.west.min(point.longitude);
        self.east = self.east.max(point.longitude);
    }

    /// Smallest box around the valid points, `None` if there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinates>,
    {
        points
            .into_iter()
            .filter(Coordinates::is_valid)
            .fold(None, |bbox: Option<Self>, point| match bbox {
                None => Some(Self::around(point)),
                Some(mut b) => {
                    b.extend(point);
                    Some(b)
                }
            })
    }

    pub fn center(&self) -> Coordinates {
        Coordinates::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportFitter {
    default_region: MapRegion,
    padding: f64,
    min_span: f64,
}

impl ViewportFitter {
    /// `padding` is the fraction of the box added to each span; `min_span`
    /// floors both spans so a single point still gets a valid region.
    pub fn new(default_region: MapRegion, padding: f64, min_span: f64) -> Self {
        Self {
            default_region,
            padding: if padding.is_finite() { padding.max(0.0) } else { 0.0 },
            min_span: if min_span.is_finite() && min_span > 0.0 {
                min_span
            } else {
                f64::EPSILON
            },
        }
    }

    pub fn from_config(config: &GuideConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.city.default_region()?,
            config.viewport.padding,
            config.viewport.min_span,
        ))
    }

    pub fn default_region(&self) -> MapRegion {
        self.default_region
    }

    pub fn min_span(&self) -> f64 {
        self.min_span
    }

    /// Frame `points` with the configured padding.
    pub fn fit<I>(&self, points: I) -> MapRegion
    where
        I: IntoIterator<Item = Coordinates>,
    {
        self.fit_with_padding(points, self.padding)
    }

    /// Frame raw latitude/longitude pairs where either half may be missing.
    pub fn fit_raw<I>(&self, points: I) -> MapRegion
    where
        I: IntoIterator<Item = (Option<f64>, Option<f64>)>,
    {
        self.fit(points.into_iter().filter_map(|pair| match pair {
            (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
            _ => None,
        }))
    }

    pub fn fit_with_padding<I>(&self, points: I, padding: f64) -> MapRegion
    where
        I: IntoIterator<Item = Coordinates>,
    {
        let Some(bbox) = BoundingBox::from_points(points) else {
            return self.default_region;
        };

        let padding = if padding.is_finite() { padding.max(0.0) } else { 0.0 };
        let latitude_delta = ((bbox.north - bbox.south) * (1.0 + padding)).max(self.min_span);
        let longitude_delta = ((bbox.east - bbox.west) * (1.0 + padding)).max(self.min_span);

        match MapRegion::new(bbox.center(), latitude_delta, longitude_delta) {
            Some(region) => region,
            None => {
                debug!(?bbox, "Fitted region is invalid, keeping the default region");
                self.default_region
            }
        }
    }
}
