//! Site catalog accessor.
//!
//! Fetches the flat list of sites once, caches it, and hands out read-only
//! snapshots. A failed fetch is not an error for callers: the catalog becomes
//! empty and the failure is logged.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{error, info, warn};

use crate::http::ApiError;
use crate::models::{Category, Site, SiteId};

/// Source of catalog data (the remote service, or a fixture in tests).
#[async_trait]
pub trait SiteSource: Send + Sync {
    async fn fetch_sites(&self) -> Result<Vec<Site>, ApiError>;

    async fn fetch_site(&self, id: SiteId) -> Result<Option<Site>, ApiError>;

    async fn fetch_sites_by_category(&self, category: &Category) -> Result<Vec<Site>, ApiError>;
}

/// Immutable view of one catalog load.
pub type CatalogSnapshot = Arc<[Site]>;

/// Load status of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogStatus {
    NotLoaded,
    Loaded { count: usize },
    /// The fetch failed; the catalog is empty until the next load.
    Empty { reason: String },
}

/// Caching accessor over a [`SiteSource`].
#[derive(Clone)]
pub struct SiteCatalog {
    source: Arc<dyn SiteSource>,
    inner: Arc<RwLock<CatalogState>>,
}

struct CatalogState {
    sites: CatalogSnapshot,
    status: CatalogStatus,
}

impl SiteCatalog {
    pub fn new(source: Arc<dyn SiteSource>) -> Self {
        Self {
            source,
            inner: Arc::new(RwLock::new(CatalogState {
                sites: Arc::from(Vec::new()),
                status: CatalogStatus::NotLoaded,
            })),
        }
    }

    /// Fetch the catalog and replace the cached snapshot.
    ///
    /// Never fails: a transport or parse error leaves an empty catalog.
    pub async fn load(&self) -> CatalogSnapshot {
        let (sites, status) = match self.source.fetch_sites().await {
            Ok(fetched) => {
                let sites = dedupe_by_id(fetched);
                info!(count = sites.len(), "Site catalog loaded");
                let count = sites.len();
                (sites, CatalogStatus::Loaded { count })
            }
            Err(e) => {
                error!(error = %e, "Error fetching sites, continuing with an empty catalog");
                (
                    Vec::new(),
                    CatalogStatus::Empty {
                        reason: e.to_string(),
                    },
                )
            }
        };

        let snapshot: CatalogSnapshot = Arc::from(sites);
        let mut state = self.inner.write();
        state.sites = Arc::clone(&snapshot);
        state.status = status;
        snapshot
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        Arc::clone(&self.inner.read().sites)
    }

    pub fn status(&self) -> CatalogStatus {
        self.inner.read().status.clone()
    }

    pub fn is_loaded(&self) -> bool {
        !matches!(self.status(), CatalogStatus::NotLoaded)
    }

    pub fn get(&self, id: SiteId) -> Option<Site> {
        self.inner.read().sites.iter().find(|s| s.id == id).cloned()
    }

    pub fn contains(&self, id: SiteId) -> bool {
        self.inner.read().sites.iter().any(|s| s.id == id)
    }

    /// Distinct categories of the current snapshot.
    pub fn categories(&self) -> BTreeSet<Category> {
        categories_of(&self.snapshot())
    }

    pub fn by_category(&self, category: &Category) -> Vec<Site> {
        self.inner
            .read()
            .sites
            .iter()
            .filter(|s| &s.category == category)
            .cloned()
            .collect()
    }

    /// Case-insensitive substring match on the site name.
    pub fn search(&self, text: &str) -> Vec<Site> {
        let needle = text.trim().to_lowercase();
        let state = self.inner.read();
        if needle.is_empty() {
            return state.sites.to_vec();
        }
        state
            .sites
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Fetch one site directly from the source, bypassing the cache.
    pub async fn fetch_site(&self, id: SiteId) -> Option<Site> {
        match self.source.fetch_site(id).await {
            Ok(site) => site,
            Err(e) => {
                error!(site_id = %id, error = %e, "Error fetching site");
                None
            }
        }
    }

    /// Fetch the sites of one category directly from the source.
    pub async fn fetch_by_category(&self, category: &Category) -> Vec<Site> {
        match self.source.fetch_sites_by_category(category).await {
            Ok(sites) => sites,
            Err(e) => {
                error!(%category, error = %e, "Error fetching sites for category");
                Vec::new()
            }
        }
    }
}

/// Distinct categories of `sites`.
pub fn categories_of(sites: &[Site]) -> BTreeSet<Category> {
    sites.iter().map(|s| s.category.clone()).collect()
}

fn dedupe_by_id(sites: Vec<Site>) -> Vec<Site> {
    let mut seen = HashSet::with_capacity(sites.len());
    sites
        .into_iter()
        .filter(|site| {
            let fresh = seen.insert(site.id);
            if !fresh {
                warn!(site_id = %site.id, "Duplicate site id in catalog, keeping the first");
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod catalog_tests;
