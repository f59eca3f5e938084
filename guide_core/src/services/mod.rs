//! Service layer for the trip-planning core.
//!
//! Leaves first: the catalog accessor and location resolver talk to the
//! outside world through traits; the filter, viewport fitter and route draft
//! are pure state; route generation and the planner orchestrate them.

pub mod catalog;

pub mod location;

pub mod category_filter;

pub mod viewport;

pub mod route_draft;
pub mod route_generation;

pub mod planner;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use catalog::{CatalogSnapshot, CatalogStatus, SiteCatalog, SiteSource};
pub use category_filter::CategoryFilter;
pub use location::{
    FixedPositionProvider, LocationError, LocationResolver, PermissionStatus, PositionProvider,
    ServiceArea,
};
pub use planner::{LoadState, SiteDetail, TripPlanner};
pub use route_draft::{Completion, DraftError, DraftPhase, GenerationToken, RouteDraft};
pub use route_generation::{RouteError, RouteGenerator, RouteOptimizer};
pub use viewport::{BoundingBox, ViewportFitter};
