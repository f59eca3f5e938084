//! Route generation client.
//!
//! Guided drafts go to the remote optimizer with the whole catalog as the
//! candidate set; the category filter is a display filter and never narrows
//! routing. Custom drafts never touch the network: the picked sites become
//! the route in the order they were picked.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::http::{ApiError, RouteRequest};
use crate::models::{LocationFix, Route, RouteMode, Site, SiteId};
use crate::services::catalog::SiteCatalog;
use crate::services::route_draft::DraftSnapshot;

/// Remote route optimizer. Returns the raw response body so that its shape
/// can be checked here rather than by the transport.
#[async_trait]
pub trait RouteOptimizer: Send + Sync {
    async fn optimize(&self, request: &RouteRequest) -> Result<Value, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// Transport or server failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The response was not a bare JSON array of catalog sites.
    #[error("Malformed route response: {0}")]
    MalformedResponse(String),

    /// A picked site is not in the visible catalog.
    #[error("Site {0} is not available")]
    UnknownSite(SiteId),

    #[error("No sites were picked")]
    EmptySelection,
}

impl From<ApiError> for RouteError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Decode(msg) => RouteError::MalformedResponse(msg),
            other => RouteError::Network(other.to_string()),
        }
    }
}

pub struct RouteGenerator {
    optimizer: Arc<dyn RouteOptimizer>,
    catalog: SiteCatalog,
}

impl RouteGenerator {
    pub fn new(optimizer: Arc<dyn RouteOptimizer>, catalog: SiteCatalog) -> Self {
        Self { optimizer, catalog }
    }

    /// Build the route for a submitted draft.
    ///
    /// `filtered` is the category-filtered catalog the picks were made from.
    pub async fn generate(
        &self,
        draft: &DraftSnapshot,
        filtered: &[Site],
        fix: &LocationFix,
    ) -> Result<Route, RouteError> {
        match draft.mode {
            RouteMode::Custom => custom_route(&draft.site_ids, filtered),
            RouteMode::Guided => self.guided_route(draft, fix).await,
        }
    }

    async fn guided_route(
        &self,
        draft: &DraftSnapshot,
        fix: &LocationFix,
    ) -> Result<Route, RouteError> {
        let catalog = self.catalog.snapshot();
        let request = guided_request(draft, &catalog, fix);
        debug!(
            candidates = request.sites.len(),
            available_time = ?request.available_time,
            fallback_start = fix.is_fallback(),
            "Requesting guided route"
        );

        let body = self.optimizer.optimize(&request).await?;
        let route = parse_route_response(body, &catalog)?;
        info!(sites = route.len(), "Guided route received");
        Ok(route)
    }
}

/// Request body for a guided draft: every catalog site is a candidate.
pub fn guided_request(draft: &DraftSnapshot, catalog: &[Site], fix: &LocationFix) -> RouteRequest {
    RouteRequest {
        sites: catalog.iter().map(|s| s.id).collect(),
        starting_point: Some(fix.coordinates.into()),
        available_time: draft.time_budget.map(|budget| budget.hours()),
    }
}

/// Wrap the picked sites, in pick order, as a route.
pub fn custom_route(site_ids: &[SiteId], filtered: &[Site]) -> Result<Route, RouteError> {
    if site_ids.is_empty() {
        return Err(RouteError::EmptySelection);
    }
    let by_id: HashMap<SiteId, &Site> = filtered.iter().map(|s| (s.id, s)).collect();
    let sites = site_ids
        .iter()
        .map(|id| {
            by_id
                .get(id)
                .map(|site| (*site).clone())
                .ok_or(RouteError::UnknownSite(*id))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Route::new(sites))
}

/// Validate an optimizer response.
///
/// The body must be a bare array of sites (no envelope), and every returned
/// site must belong to `catalog`. Sites are taken from the catalog so the
/// route never holds data the catalog does not.
pub fn parse_route_response(body: Value, catalog: &[Site]) -> Result<Route, RouteError> {
    if !body.is_array() {
        return Err(RouteError::MalformedResponse(format!(
            "expected a JSON array of sites, got {}",
            json_kind(&body)
        )));
    }

    let returned: Vec<Site> = serde_path_to_error::deserialize(body).map_err(|e| {
        RouteError::MalformedResponse(format!("at {}: {}", e.path(), e.inner()))
    })?;

    let by_id: HashMap<SiteId, &Site> = catalog.iter().map(|s| (s.id, s)).collect();
    let sites = returned
        .iter()
        .map(|site| {
            by_id.get(&site.id).map(|s| (*s).clone()).ok_or_else(|| {
                RouteError::MalformedResponse(format!("site {} is not in the catalog", site.id))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Route::new(sites))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, FallbackReason, TimeBudget};
    use crate::services::test_fixtures::{catania_sites, site, StubSource};
    use parking_lot::Mutex;
    use serde_json::json;

    struct RecordingOptimizer {
        response: Result<Value, ApiError>,
        requests: Mutex<Vec<RouteRequest>>,
    }

    impl RecordingOptimizer {
        fn new(response: Result<Value, ApiError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl RouteOptimizer for RecordingOptimizer {
        async fn optimize(&self, request: &RouteRequest) -> Result<Value, ApiError> {
            self.requests.lock().push(request.clone());
            self.response.clone()
        }
    }

    async fn generator(optimizer: Arc<RecordingOptimizer>) -> RouteGenerator {
        let catalog = SiteCatalog::new(Arc::new(StubSource::ok(catania_sites())));
        catalog.load().await;
        RouteGenerator::new(optimizer, catalog)
    }

    fn guided(budget: TimeBudget) -> DraftSnapshot {
        DraftSnapshot {
            mode: RouteMode::Guided,
            time_budget: Some(budget),
            site_ids: vec![],
        }
    }

    fn fix() -> LocationFix {
        LocationFix::device(Coordinates::new(37.503, 15.088))
    }

    fn sites_json(ids: &[i64]) -> Value {
        let all = catania_sites();
        Value::Array(
            ids.iter()
                .map(|id| {
                    let site = all.iter().find(|s| s.id.value() == *id).unwrap();
                    serde_json::to_value(site).unwrap()
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_guided_sends_full_catalog_and_hours() {
        let optimizer = RecordingOptimizer::new(Ok(sites_json(&[3, 1])));
        let generator = generator(optimizer.clone()).await;

        // Only churches are visible, but routing sees everything.
        let filtered: Vec<Site> = catania_sites()
            .into_iter()
            .filter(|s| s.category == crate::models::Category::Church)
            .collect();
        let route = generator
            .generate(&guided(TimeBudget::HalfDay), &filtered, &fix())
            .await
            .unwrap();

        assert_eq!(route.site_ids(), vec![SiteId::new(3), SiteId::new(1)]);

        let requests = optimizer.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].sites.len(), 6);
        assert_eq!(requests[0].available_time, Some(4.0));
        assert_eq!(
            requests[0].starting_point,
            Some(Coordinates::new(37.503, 15.088).into())
        );
    }

    #[tokio::test]
    async fn test_fallback_fix_is_still_the_starting_point() {
        let optimizer = RecordingOptimizer::new(Ok(json!([])));
        let generator = generator(optimizer.clone()).await;
        let anchor = Coordinates::new(37.5022, 15.0873);
        let fix = LocationFix::fallback(anchor, FallbackReason::PermissionDenied);

        let route = generator
            .generate(&guided(TimeBudget::OneHour), &[], &fix)
            .await
            .unwrap();

        assert!(route.is_empty());
        assert_eq!(
            optimizer.requests.lock()[0].starting_point,
            Some(anchor.into())
        );
    }

    #[tokio::test]
    async fn test_enveloped_response_is_malformed() {
        let optimizer = RecordingOptimizer::new(Ok(json!({ "route": sites_json(&[1]) })));
        let generator = generator(optimizer).await;

        let err = generator
            .generate(&guided(TimeBudget::TwoHours), &[], &fix())
            .await
            .unwrap_err();

        match err {
            RouteError::MalformedResponse(msg) => assert!(msg.contains("an object")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_network_error_propagates() {
        let optimizer = RecordingOptimizer::new(Err(ApiError::Status {
            status: 502,
            body: "bad gateway".into(),
        }));
        let generator = generator(optimizer).await;

        let err = generator
            .generate(&guided(TimeBudget::TwoHours), &[], &fix())
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::Network(msg) if msg.contains("502")));
    }

    #[tokio::test]
    async fn test_custom_route_skips_network() {
        let optimizer = RecordingOptimizer::new(Err(ApiError::Transport("offline".into())));
        let generator = generator(optimizer.clone()).await;
        let draft = DraftSnapshot {
            mode: RouteMode::Custom,
            time_budget: Some(TimeBudget::OneHour),
            site_ids: vec![SiteId::new(5), SiteId::new(2)],
        };

        let route = generator
            .generate(&draft, &catania_sites(), &fix())
            .await
            .unwrap();

        assert_eq!(route.site_ids(), vec![SiteId::new(5), SiteId::new(2)]);
        assert!(optimizer.requests.lock().is_empty());
    }

    #[test]
    fn test_custom_route_rejects_unknown_and_empty() {
        let sites = catania_sites();
        assert_eq!(
            custom_route(&[SiteId::new(1), SiteId::new(77)], &sites),
            Err(RouteError::UnknownSite(SiteId::new(77)))
        );
        assert_eq!(custom_route(&[], &sites), Err(RouteError::EmptySelection));
    }

    #[test]
    fn test_bad_element_reports_path() {
        let body = json!([
            serde_json::to_value(&catania_sites()[0]).unwrap(),
            { "id": "two", "name": "x", "category": "chiesa", "latitude": 1.0, "longitude": 2.0 }
        ]);
        let err = parse_route_response(body, &catania_sites()).unwrap_err();
        match err {
            RouteError::MalformedResponse(msg) => assert!(msg.contains("[1].id"), "{}", msg),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_sites_outside_catalog_are_malformed() {
        let stranger = site(99, "Etna", "parco", 37.75, 14.99);
        let body = json!([serde_json::to_value(&stranger).unwrap()]);
        let err = parse_route_response(body, &catania_sites()).unwrap_err();
        assert!(matches!(err, RouteError::MalformedResponse(msg) if msg.contains("99")));
    }

    #[test]
    fn test_non_json_body_maps_to_malformed() {
        let err: RouteError = ApiError::Decode("expected value at line 1".into()).into();
        assert!(matches!(err, RouteError::MalformedResponse(_)));
    }
}
