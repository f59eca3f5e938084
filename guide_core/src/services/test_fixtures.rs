//! Shared fixtures for service unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::catalog::SiteSource;
use crate::http::ApiError;
use crate::models::{Category, Site, SiteId};

pub fn site(id: i64, name: &str, category: &str, latitude: f64, longitude: f64) -> Site {
    Site {
        id: SiteId::new(id),
        name: name.to_string(),
        description: format!("{} (breve)", name),
        description_en: None,
        detailed_description: format!("{} (dettagli)", name),
        detailed_description_en: None,
        category: Category::parse(category),
        latitude,
        longitude,
        audio_url_it: None,
        audio_url_en: None,
    }
}

pub fn catania_sites() -> Vec<Site> {
    vec![
        site(1, "Cattedrale di Sant'Agata", "chiesa", 37.5023, 15.0875),
        site(2, "Castello Ursino", "castello", 37.4992, 15.0836),
        site(3, "Teatro Massimo Bellini", "teatro", 37.5038, 15.0905),
        site(4, "Museo Civico", "musei", 37.4993, 15.0838),
        site(5, "Villa Bellini", "parco", 37.5105, 15.0856),
        site(6, "Badia di Sant'Agata", "chiese", 37.5027, 15.0880),
    ]
}

/// In-memory [`SiteSource`] that counts catalog fetches.
pub struct StubSource {
    result: Mutex<Result<Vec<Site>, ApiError>>,
    pub fetches: AtomicUsize,
}

impl StubSource {
    pub fn ok(sites: Vec<Site>) -> Self {
        Self {
            result: Mutex::new(Ok(sites)),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: ApiError) -> Self {
        Self {
            result: Mutex::new(Err(error)),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Serve `sites` from the next fetch on.
    pub fn set_sites(&self, sites: Vec<Site>) {
        *self.result.lock() = Ok(sites);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SiteSource for StubSource {
    async fn fetch_sites(&self) -> Result<Vec<Site>, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.result.lock().clone()
    }

    async fn fetch_site(&self, id: SiteId) -> Result<Option<Site>, ApiError> {
        let sites = self.result.lock().clone()?;
        Ok(sites.into_iter().find(|s| s.id == id))
    }

    async fn fetch_sites_by_category(&self, category: &Category) -> Result<Vec<Site>, ApiError> {
        let sites = self.result.lock().clone()?;
        Ok(sites.into_iter().filter(|s| &s.category == category).collect())
    }
}
