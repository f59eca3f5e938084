//! Catania Guide command-line driver.
//!
//! Loads the catalog, resolves a position and optionally plans a route
//! against the configured guide service.
//!
//! # Usage
//!
//! ```bash
//! # List sites and categories
//! cargo run --bin guide
//!
//! # Guided route for half a day, starting from a device position
//! GUIDE_LAT=37.503 GUIDE_LON=15.088 cargo run --bin guide -- guided half_day
//!
//! # Custom route through sites 5, 1 and 3, only churches and parks visible
//! GUIDE_CATEGORIES=chiesa,parco cargo run --bin guide -- custom 2h 5,1,3
//! ```
//!
//! # Environment Variables
//!
//! - `GUIDE_API_URL`, `GUIDE_API_TIMEOUT_SECS`, `GUIDE_LANGUAGE`: config overrides
//! - `GUIDE_LAT` / `GUIDE_LON`: simulated device position (permission is
//!   treated as denied when unset)
//! - `GUIDE_CATEGORIES`: comma-separated category filter
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use catania_guide::http::ApiClient;
use catania_guide::models::{Category, Coordinates, RouteMode, SiteId, TimeBudget};
use catania_guide::services::{Completion, FixedPositionProvider, TripPlanner};
use catania_guide::{GuideConfig, GuideContext};

fn position_provider() -> Result<FixedPositionProvider> {
    match (env::var("GUIDE_LAT"), env::var("GUIDE_LON")) {
        (Ok(lat), Ok(lon)) => {
            let latitude: f64 = lat.parse().context("GUIDE_LAT must be a number")?;
            let longitude: f64 = lon.parse().context("GUIDE_LON must be a number")?;
            Ok(FixedPositionProvider::granted(Coordinates::new(
                latitude, longitude,
            )))
        }
        _ => Ok(FixedPositionProvider::denied()),
    }
}

fn parse_site_ids(list: &str) -> Result<Vec<SiteId>> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.parse::<SiteId>()
                .with_context(|| format!("invalid site id '{}'", s))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let config = GuideConfig::load()?.apply_env_overrides()?;
    info!(city = %config.city.name, api = %config.api.base_url, "Starting guide");

    let api = Arc::new(ApiClient::new(&config.api)?);
    let context = GuideContext::new(config.language);
    let planner = TripPlanner::with_api(&config, context, api, Arc::new(position_provider()?))?;

    let load = planner.start().await;
    let fix = planner
        .location()
        .context("location must be resolved after start")?;
    println!(
        "Position: {:.4}, {:.4}{}",
        fix.coordinates.latitude,
        fix.coordinates.longitude,
        if fix.is_fallback() { " (city anchor)" } else { "" }
    );
    if !load.is_ready() {
        bail!("planner did not finish loading");
    }

    if let Ok(list) = env::var("GUIDE_CATEGORIES") {
        for label in list.split(',').filter(|s| !s.trim().is_empty()) {
            planner.toggle_category(Category::parse(label));
        }
    }

    let categories: Vec<String> = planner.categories().iter().map(|c| c.to_string()).collect();
    println!("Categories: {}", categories.join(", "));
    for site in planner.filtered_sites() {
        println!("  [{}] {} ({})", site.id, site.name, site.category);
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(mode) = args.first() else {
        return Ok(());
    };
    let budget: TimeBudget = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("half_day")
        .parse()
        .map_err(anyhow::Error::msg)?;

    match mode.as_str() {
        "guided" => planner.choose_mode(RouteMode::Guided)?,
        "custom" => {
            planner.choose_mode(RouteMode::Custom)?;
            let ids = parse_site_ids(args.get(2).map(String::as_str).unwrap_or(""))?;
            for id in ids {
                planner.toggle_site(id)?;
            }
        }
        other => bail!("unknown mode '{}', expected guided or custom", other),
    }
    planner.select_time(budget)?;

    match planner.submit().await? {
        Completion::Succeeded(route) => {
            println!("Route ({} stops):", route.len());
            for (i, site) in route.sites().iter().enumerate() {
                println!("  {}. {}", i + 1, site.name);
            }
            let region = planner.region();
            println!(
                "Viewport: center {:.4}, {:.4} span {:.4} x {:.4}",
                region.latitude, region.longitude, region.latitude_delta, region.longitude_delta
            );
            Ok(())
        }
        Completion::Failed(e) => bail!("route generation failed: {}", e),
        Completion::Stale => bail!("route generation result was discarded"),
    }
}
