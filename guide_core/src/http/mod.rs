//! Remote guide service access.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Services (catalog, route generation)                    │
//! │  - depend only on the SiteSource / RouteOptimizer traits │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  ApiClient (reqwest)                                     │
//! │  - GET  /sites, /sites/{id}, /sites/category/{label}     │
//! │  - POST /routes/generate                                 │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;

#[cfg(feature = "http-client")]
pub mod client;

#[cfg(feature = "http-client")]
pub use client::ApiClient;

pub use dto::{RouteRequest, StartingPoint};
pub use error::ApiError;
