//! # Catania Guide
//!
//! Client-side core of a single-city tourist guide: points of interest on a
//! map, a category filter, and a visiting-route planner that either asks a
//! remote optimizer for a route ("guided") or uses the visitor's own picks
//! ("custom").
//!
//! ## Architecture
//!
//! - [`models`]: sites, coordinates, regions, routes and time budgets
//! - [`services`]: catalog accessor, location resolver, category filter,
//!   viewport fitter, route draft state machine, route generation and the
//!   [`services::TripPlanner`] that wires them together
//! - [`http`]: wire types and the reqwest client for the remote service
//! - [`config`]: TOML configuration with environment overrides
//! - [`context`]: explicit process-scoped state (display language)
//!
//! Rendering, icons, translations and audio playback belong to the
//! presentation layer and are not part of this crate.

pub mod config;
pub mod context;
pub mod http;
pub mod models;
pub mod services;

pub use config::{ConfigError, GuideConfig};
pub use context::GuideContext;
