//! Wire shapes for the remote service.

use serde::{Deserialize, Serialize};

use crate::models::{Coordinates, SiteId};

/// Starting point of a guided route.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coordinates> for StartingPoint {
    fn from(c: Coordinates) -> Self {
        Self {
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}

/// Body of `POST /routes/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    /// Candidate site ids
    pub sites: Vec<SiteId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_point: Option<StartingPoint>,
    /// Time budget in hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_time: Option<f64>,
}
