//! Guide configuration file support.
//!
//! Settings are read from a TOML file, then optionally overridden by
//! environment variables. Every field has a default, so an empty file (or no
//! file at all) yields a working configuration for Catania.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{Coordinates, Language, MapRegion};

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No guide.toml found in standard locations")]
    NotFound,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Full guide configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuideConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub city: CitySettings,
    #[serde(default)]
    pub viewport: ViewportSettings,
    #[serde(default)]
    pub language: Language,
}

/// Remote service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// The city the guide covers: anchor, geofence radius and default camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySettings {
    #[serde(default = "default_city_name")]
    pub name: String,
    #[serde(default = "default_anchor_latitude")]
    pub anchor_latitude: f64,
    #[serde(default = "default_anchor_longitude")]
    pub anchor_longitude: f64,
    /// Geofence radius in degrees (0.3 is roughly 30 km).
    #[serde(default = "default_service_radius")]
    pub service_radius_deg: f64,
    #[serde(default = "default_delta")]
    pub default_latitude_delta: f64,
    #[serde(default = "default_delta")]
    pub default_longitude_delta: f64,
}

/// Viewport fitting parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportSettings {
    /// Fraction of the bounding box added to each span.
    #[serde(default = "default_padding")]
    pub padding: f64,
    /// Smallest span a fitted region may have, in degrees.
    #[serde(default = "default_min_span")]
    pub min_span: f64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_city_name() -> String {
    "Catania".to_string()
}

// Piazza del Duomo
fn default_anchor_latitude() -> f64 {
    37.5022
}

fn default_anchor_longitude() -> f64 {
    15.0873
}

fn default_service_radius() -> f64 {
    0.3
}

fn default_delta() -> f64 {
    0.05
}

fn default_padding() -> f64 {
    0.2
}

fn default_min_span() -> f64 {
    0.01
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CitySettings {
    fn default() -> Self {
        Self {
            name: default_city_name(),
            anchor_latitude: default_anchor_latitude(),
            anchor_longitude: default_anchor_longitude(),
            service_radius_deg: default_service_radius(),
            default_latitude_delta: default_delta(),
            default_longitude_delta: default_delta(),
        }
    }
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            padding: default_padding(),
            min_span: default_min_span(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CitySettings {
    pub fn anchor(&self) -> Coordinates {
        Coordinates::new(self.anchor_latitude, self.anchor_longitude)
    }

    /// The camera shown before anything else is known.
    pub fn default_region(&self) -> Result<MapRegion, ConfigError> {
        MapRegion::new(
            self.anchor(),
            self.default_latitude_delta,
            self.default_longitude_delta,
        )
        .ok_or_else(|| {
            ConfigError::Invalid(format!(
                "default region for {} needs a valid anchor and positive deltas",
                self.name
            ))
        })
    }
}

impl GuideConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GuideConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `guide.toml` in:
    /// 1. Current directory
    /// 2. `guide_core/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("guide.toml"),
            PathBuf::from("guide_core/guide.toml"),
            PathBuf::from("../guide.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(ConfigError::NotFound)
    }

    /// Load from the default location, falling back to built-in defaults when
    /// no file exists. Parse and validation errors are still reported.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::from_default_location() {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Apply environment overrides.
    ///
    /// # Environment Variables
    /// - `GUIDE_API_URL`: remote service base URL
    /// - `GUIDE_API_TIMEOUT_SECS`: request timeout in seconds
    /// - `GUIDE_LANGUAGE`: `it` or `en`
    pub fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(url) = env::var("GUIDE_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(timeout) = env::var("GUIDE_API_TIMEOUT_SECS") {
            self.api.timeout_secs = timeout.parse().map_err(|_| {
                ConfigError::Invalid("GUIDE_API_TIMEOUT_SECS must be a whole number".to_string())
            })?;
        }
        if let Ok(language) = env::var("GUIDE_LANGUAGE") {
            self.language = language.parse().map_err(ConfigError::Invalid)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url must not be empty".into()));
        }
        if !(self.city.service_radius_deg.is_finite() && self.city.service_radius_deg > 0.0) {
            return Err(ConfigError::Invalid(
                "city.service_radius_deg must be positive".into(),
            ));
        }
        self.city.default_region()?;
        if !(self.viewport.padding.is_finite() && self.viewport.padding >= 0.0) {
            return Err(ConfigError::Invalid(
                "viewport.padding must be zero or positive".into(),
            ));
        }
        if !(self.viewport.min_span.is_finite() && self.viewport.min_span > 0.0) {
            return Err(ConfigError::Invalid("viewport.min_span must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
