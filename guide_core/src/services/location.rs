//! Location resolver.
//!
//! Turns the device positioning API into a [`LocationFix`] that is always
//! usable by the planner. The permission prompt is shown at most once per
//! resolver; every failure path falls back to the city anchor.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::CitySettings;
use crate::models::{Coordinates, FallbackReason, LocationFix};

/// Outcome of the permission prompt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Positioning failures. Both are recovered locally with the anchor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),
}

/// Device positioning API.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    async fn request_permission(&self) -> PermissionStatus;

    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Geofence around the city anchor.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ServiceArea {
    pub anchor: Coordinates,
    pub radius_deg: f64,
}

impl ServiceArea {
    pub fn new(anchor: Coordinates, radius_deg: f64) -> Self {
        Self { anchor, radius_deg }
    }

    pub fn contains(&self, point: &Coordinates) -> bool {
        point.is_valid() && point.planar_distance(&self.anchor) <= self.radius_deg
    }
}

impl From<&CitySettings> for ServiceArea {
    fn from(city: &CitySettings) -> Self {
        Self::new(city.anchor(), city.service_radius_deg)
    }
}

/// Resolves the visitor's position, never failing.
pub struct LocationResolver {
    provider: Arc<dyn PositionProvider>,
    area: ServiceArea,
    permission: OnceCell<PermissionStatus>,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn PositionProvider>, area: ServiceArea) -> Self {
        Self {
            provider,
            area,
            permission: OnceCell::new(),
        }
    }

    pub fn service_area(&self) -> ServiceArea {
        self.area
    }

    /// Permission outcome, if the prompt has already been shown.
    pub fn permission(&self) -> Option<PermissionStatus> {
        self.permission.get().copied()
    }

    /// Resolve the current position.
    ///
    /// The first call prompts for permission; later calls reuse the answer
    /// and only query the position again when permission was granted.
    pub async fn resolve(&self) -> LocationFix {
        match self.try_device_fix().await {
            Ok(coordinates) if self.area.contains(&coordinates) => {
                info!(
                    latitude = coordinates.latitude,
                    longitude = coordinates.longitude,
                    "Using device position"
                );
                LocationFix::device(coordinates)
            }
            Ok(coordinates) => {
                info!(
                    latitude = coordinates.latitude,
                    longitude = coordinates.longitude,
                    radius = self.area.radius_deg,
                    "Device position outside the service area, using the city anchor"
                );
                self.fallback(FallbackReason::OutsideServiceArea)
            }
            Err(LocationError::PermissionDenied) => {
                warn!("Location permission denied, using the city anchor");
                self.fallback(FallbackReason::PermissionDenied)
            }
            Err(LocationError::PositionUnavailable(reason)) => {
                warn!(%reason, "Error retrieving position, using the city anchor");
                self.fallback(FallbackReason::PositionUnavailable)
            }
        }
    }

    async fn try_device_fix(&self) -> Result<Coordinates, LocationError> {
        let status = *self
            .permission
            .get_or_init(|| self.provider.request_permission())
            .await;
        if status == PermissionStatus::Denied {
            return Err(LocationError::PermissionDenied);
        }
        self.provider.current_position().await
    }

    fn fallback(&self, reason: FallbackReason) -> LocationFix {
        LocationFix::fallback(self.area.anchor, reason)
    }
}

/// A [`PositionProvider`] with a fixed answer.
///
/// Used by the command-line driver (position from flags) and by tests. It
/// counts permission prompts and position queries.
#[derive(Debug)]
pub struct FixedPositionProvider {
    permission: PermissionStatus,
    position: Result<Coordinates, LocationError>,
    prompts: AtomicUsize,
    queries: AtomicUsize,
}

impl FixedPositionProvider {
    pub fn new(permission: PermissionStatus, position: Result<Coordinates, LocationError>) -> Self {
        Self {
            permission,
            position,
            prompts: AtomicUsize::new(0),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn granted(position: Coordinates) -> Self {
        Self::new(PermissionStatus::Granted, Ok(position))
    }

    pub fn denied() -> Self {
        Self::new(PermissionStatus::Denied, Err(LocationError::PermissionDenied))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::new(
            PermissionStatus::Granted,
            Err(LocationError::PositionUnavailable(reason.into())),
        )
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PositionProvider for FixedPositionProvider {
    async fn request_permission(&self) -> PermissionStatus {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.permission
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.position.clone()
    }
}
