//! reqwest-backed client for the guide service.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::dto::RouteRequest;
use super::error::ApiError;
use crate::config::ApiSettings;
use crate::models::{Category, Site, SiteId};
use crate::services::catalog::SiteSource;
use crate::services::route_generation::RouteOptimizer;

/// HTTP client for the catalog and route endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(settings.base_url.trim())
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", settings.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(settings.base_url.clone()));
        }

        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_body(response: reqwest::Response) -> Result<String, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        Ok(body)
    }

    async fn get_body(&self, segments: &[&str]) -> Result<String, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        Self::read_body(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let body = self.get_body(segments).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get_sites(&self, segments: &[&str]) -> Result<Vec<Site>, ApiError> {
        let body = self.get_body(segments).await?;
        decode_sites(&body)
    }
}

/// Decode a site list entry by entry.
///
/// The body must be a JSON array. Entries that fail to decode or carry
/// unusable coordinates are skipped with a warning.
fn decode_sites(body: &str) -> Result<Vec<Site>, ApiError> {
    let entries: Vec<Value> =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    let total = entries.len();

    let sites: Vec<Site> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            match serde_path_to_error::deserialize::<_, Site>(entry) {
                Ok(site) if site.coordinates().is_valid() => Some(site),
                Ok(site) => {
                    warn!(index, id = %site.id, "Skipping site with out-of-range coordinates");
                    None
                }
                Err(e) => {
                    warn!(index, path = %e.path(), error = %e.inner(), "Skipping malformed site");
                    None
                }
            }
        })
        .collect();

    if sites.len() < total {
        warn!(kept = sites.len(), total, "Some catalog entries were skipped");
    }
    Ok(sites)
}

#[async_trait]
impl SiteSource for ApiClient {
    async fn fetch_sites(&self) -> Result<Vec<Site>, ApiError> {
        self.get_sites(&["sites"]).await
    }

    async fn fetch_site(&self, id: SiteId) -> Result<Option<Site>, ApiError> {
        match self.get_json(&["sites", &id.to_string()]).await {
            Ok(site) => Ok(Some(site)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch_sites_by_category(&self, category: &Category) -> Result<Vec<Site>, ApiError> {
        self.get_sites(&["sites", "category", category.label()]).await
    }
}

#[async_trait]
impl RouteOptimizer for ApiClient {
    async fn optimize(&self, request: &RouteRequest) -> Result<Value, ApiError> {
        let url = self.endpoint(&["routes", "generate"])?;
        debug!(%url, candidates = request.sites.len(), "POST");
        let response = self.client.post(url).json(request).send().await?;
        let body = Self::read_body(response).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
