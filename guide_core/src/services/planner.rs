//! Trip planner: wires the services together for the map screen.
//!
//! The planner owns the filter, the route draft and the last location fix,
//! and publishes the active [`Route`] and [`MapRegion`] on `watch` channels.
//! Both are replaced wholesale; readers never see a half-built value.
//!
//! I/O (catalog fetch, positioning, route generation) runs as async tasks that
//! post their result back through the planner. Locks are never held across an
//! await point.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::{ConfigError, GuideConfig};
use crate::context::GuideContext;
use crate::models::{
    Category, Coordinates, FallbackReason, Language, LocationFix, MapRegion, Route, RouteMode,
    Site, SiteId, TimeBudget,
};
use crate::services::catalog::{CatalogSnapshot, SiteCatalog, SiteSource};
use crate::services::category_filter::CategoryFilter;
use crate::services::location::{LocationResolver, PositionProvider, ServiceArea};
use crate::services::route_draft::{
    Completion, DraftError, DraftPhase, GenerationToken, RouteDraft, Submission,
};
use crate::services::route_generation::{RouteGenerator, RouteOptimizer};
use crate::services::viewport::ViewportFitter;

/// Progress of the two start-up tasks. The map is ready only when both
/// have finished.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LoadState {
    pub catalog_loaded: bool,
    pub location_resolved: bool,
}

impl LoadState {
    pub fn is_ready(&self) -> bool {
        self.catalog_loaded && self.location_resolved
    }
}

/// Localized site content for the detail sheet opened by a marker tap.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDetail {
    pub id: SiteId,
    pub name: String,
    pub category: Category,
    pub coordinates: Coordinates,
    pub language: Language,
    pub description: String,
    pub detailed_description: String,
    pub audio_url: Option<String>,
}

impl SiteDetail {
    pub fn new(site: &Site, language: Language) -> Self {
        Self {
            id: site.id,
            name: site.name.clone(),
            category: site.category.clone(),
            coordinates: site.coordinates(),
            language,
            description: site.description(language).to_string(),
            detailed_description: site.detailed_description(language).to_string(),
            audio_url: site.audio_url(language).map(str::to_string),
        }
    }
}

#[derive(Default)]
struct PlannerState {
    filter: CategoryFilter,
    draft: RouteDraft,
    location: Option<LocationFix>,
    load: LoadState,
}

struct PreparedSubmission {
    submission: Submission,
    filtered: Vec<Site>,
    fix: LocationFix,
}

pub struct TripPlanner {
    context: GuideContext,
    catalog: SiteCatalog,
    resolver: LocationResolver,
    generator: RouteGenerator,
    fitter: ViewportFitter,
    anchor: Coordinates,
    state: Mutex<PlannerState>,
    route_tx: watch::Sender<Arc<Route>>,
    region_tx: watch::Sender<MapRegion>,
}

impl TripPlanner {
    pub fn new(
        config: &GuideConfig,
        context: GuideContext,
        source: Arc<dyn SiteSource>,
        optimizer: Arc<dyn RouteOptimizer>,
        positions: Arc<dyn PositionProvider>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let fitter = ViewportFitter::from_config(config)?;
        let catalog = SiteCatalog::new(source);
        let resolver = LocationResolver::new(positions, ServiceArea::from(&config.city));
        let generator = RouteGenerator::new(optimizer, catalog.clone());

        let (route_tx, _) = watch::channel(Arc::new(Route::empty()));
        let (region_tx, _) = watch::channel(fitter.default_region());

        Ok(Self {
            context,
            catalog,
            resolver,
            generator,
            fitter,
            anchor: config.city.anchor(),
            state: Mutex::new(PlannerState::default()),
            route_tx,
            region_tx,
        })
    }

    /// Planner backed by the remote service for both catalog and routing.
    #[cfg(feature = "http-client")]
    pub fn with_api(
        config: &GuideConfig,
        context: GuideContext,
        api: Arc<crate::http::ApiClient>,
        positions: Arc<dyn PositionProvider>,
    ) -> Result<Self, ConfigError> {
        Self::new(config, context, api.clone(), api, positions)
    }

    pub fn context(&self) -> &GuideContext {
        &self.context
    }

    pub fn catalog(&self) -> &SiteCatalog {
        &self.catalog
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load the catalog and resolve the location concurrently.
    pub async fn start(&self) -> LoadState {
        future::join(self.load_catalog(), self.refresh_location()).await;
        let load = self.load_state();
        info!(ready = load.is_ready(), "Planner started");
        load
    }

    /// (Re)load the catalog. Returns the number of sites.
    ///
    /// Picks hidden by the new catalog are dropped, and so are active route
    /// stops that no longer exist.
    pub async fn load_catalog(&self) -> usize {
        let snapshot = self.catalog.load().await;
        let mut state = self.state.lock();
        state.load.catalog_loaded = true;
        let filtered = state.filter.apply(&snapshot);
        state.draft.retain_available(&filtered);

        // Under the state lock so a completing generation cannot publish
        // stops from the previous catalog after this prune.
        self.prune_route(&snapshot);
        snapshot.len()
    }

    /// Resolve the position again and recenter the map on it.
    ///
    /// The permission prompt is only ever shown on the first call.
    pub async fn refresh_location(&self) -> LocationFix {
        let fix = self.resolver.resolve().await;
        {
            let mut state = self.state.lock();
            state.location = Some(fix);
            state.load.location_resolved = true;
        }
        self.publish_region(self.fitter.fit([fix.coordinates]));
        fix
    }

    pub fn load_state(&self) -> LoadState {
        self.state.lock().load
    }

    pub fn is_ready(&self) -> bool {
        self.load_state().is_ready()
    }

    pub fn location(&self) -> Option<LocationFix> {
        self.state.lock().location
    }

    // =========================================================================
    // Category filter
    // =========================================================================

    pub fn categories(&self) -> BTreeSet<Category> {
        self.catalog.categories()
    }

    pub fn selected_categories(&self) -> BTreeSet<Category> {
        self.state.lock().filter.selection().clone()
    }

    /// Sites to show as markers.
    pub fn filtered_sites(&self) -> Vec<Site> {
        let snapshot = self.catalog.snapshot();
        self.state.lock().filter.apply(&snapshot)
    }

    pub fn toggle_category(&self, category: Category) -> Vec<Site> {
        self.update_filter(|filter, _| filter.toggle(category))
    }

    pub fn select_all_categories(&self) -> Vec<Site> {
        self.update_filter(|filter, snapshot| filter.select_all(snapshot))
    }

    fn update_filter<F>(&self, change: F) -> Vec<Site>
    where
        F: FnOnce(&mut CategoryFilter, &[Site]),
    {
        let snapshot = self.catalog.snapshot();
        let mut state = self.state.lock();
        change(&mut state.filter, &snapshot[..]);
        let filtered = state.filter.apply(&snapshot);
        state.draft.retain_available(&filtered);
        filtered
    }

    // =========================================================================
    // Route draft
    // =========================================================================

    /// Copy of the current draft, for rendering.
    pub fn draft(&self) -> RouteDraft {
        self.state.lock().draft.clone()
    }

    pub fn draft_phase(&self) -> DraftPhase {
        self.state.lock().draft.phase()
    }

    pub fn choose_mode(&self, mode: RouteMode) -> Result<(), DraftError> {
        self.state.lock().draft.choose_mode(mode)
    }

    pub fn select_time(&self, budget: TimeBudget) -> Result<(), DraftError> {
        self.state.lock().draft.select_time(budget)
    }

    pub fn toggle_site(&self, id: SiteId) -> Result<bool, DraftError> {
        let snapshot = self.catalog.snapshot();
        let mut state = self.state.lock();
        let filtered = state.filter.apply(&snapshot);
        state.draft.toggle_site(id, &filtered)
    }

    pub fn dismiss_error(&self) {
        self.state.lock().draft.dismiss_error();
    }

    /// Close the planner. A generation still in flight will be ignored.
    pub fn cancel_draft(&self) {
        self.state.lock().draft.cancel();
    }

    /// Submit the draft and wait for the outcome.
    pub async fn submit(&self) -> Result<Completion, DraftError> {
        if self.location().is_none() {
            self.refresh_location().await;
        }
        let prepared = self.prepare_submission()?;
        let result = self
            .generator
            .generate(&prepared.submission.draft, &prepared.filtered, &prepared.fix)
            .await;
        Ok(self.finish(prepared.submission.token, result))
    }

    /// Submit the draft and generate in a background task.
    ///
    /// The state change to `Submitting` happens before this returns, so a
    /// second call is rejected immediately.
    pub fn spawn_submit(self: &Arc<Self>) -> Result<JoinHandle<Completion>, DraftError> {
        let prepared = self.prepare_submission()?;
        let planner = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let result = planner
                .generator
                .generate(&prepared.submission.draft, &prepared.filtered, &prepared.fix)
                .await;
            planner.finish(prepared.submission.token, result)
        }))
    }

    fn prepare_submission(&self) -> Result<PreparedSubmission, DraftError> {
        let snapshot = self.catalog.snapshot();
        let mut state = self.state.lock();
        let submission = state.draft.begin_submit()?;
        let filtered = state.filter.apply(&snapshot);
        let fix = state.location.unwrap_or_else(|| {
            debug!("No location fix yet, starting from the city anchor");
            LocationFix::fallback(self.anchor, FallbackReason::PositionUnavailable)
        });
        Ok(PreparedSubmission {
            submission,
            filtered,
            fix,
        })
    }

    fn finish(
        &self,
        token: GenerationToken,
        result: Result<Route, crate::services::route_generation::RouteError>,
    ) -> Completion {
        // Held through the publish so a concurrent reload prunes after it.
        let mut state = self.state.lock();
        let completion = state.draft.complete(token, result);
        match completion {
            Completion::Succeeded(route) => {
                // The catalog may have been reloaded while generating.
                let route = restrict_to_catalog(&route, &self.catalog.snapshot());
                self.show_route(route.clone());
                Completion::Succeeded(route)
            }
            other => other,
        }
    }

    // =========================================================================
    // Map surface
    // =========================================================================

    pub fn active_route(&self) -> Arc<Route> {
        self.route_tx.borrow().clone()
    }

    pub fn region(&self) -> MapRegion {
        *self.region_tx.borrow()
    }

    pub fn subscribe_route(&self) -> watch::Receiver<Arc<Route>> {
        self.route_tx.subscribe()
    }

    pub fn subscribe_region(&self) -> watch::Receiver<MapRegion> {
        self.region_tx.subscribe()
    }

    /// Remove the active route from the map.
    pub fn clear_route(&self) {
        self.show_route(Route::empty());
    }

    /// Detail for a tapped marker, in the current display language.
    pub fn marker_tapped(&self, id: SiteId) -> Option<SiteDetail> {
        self.catalog
            .get(id)
            .map(|site| SiteDetail::new(&site, self.context.language()))
    }

    fn show_route(&self, route: Route) {
        let region = self.fitter.fit(route.coordinates());
        self.route_tx.send_replace(Arc::new(route));
        self.publish_region(region);
    }

    fn publish_region(&self, region: MapRegion) {
        self.region_tx.send_replace(region);
    }

    fn prune_route(&self, snapshot: &CatalogSnapshot) {
        let current = self.active_route();
        let kept = restrict_to_catalog(&current, snapshot);
        if kept != *current {
            self.show_route(kept);
        }
    }
}

/// Rebuild `route` from the catalog's copies of its stops, dropping stops
/// the catalog no longer has.
fn restrict_to_catalog(route: &Route, snapshot: &[Site]) -> Route {
    let kept: Vec<Site> = route
        .sites()
        .iter()
        .filter_map(|stop| snapshot.iter().find(|s| s.id == stop.id).cloned())
        .collect();
    if kept.len() != route.len() {
        debug!(
            before = route.len(),
            after = kept.len(),
            "Dropped route stops missing from the catalog"
        );
    }
    Route::new(kept)
}
