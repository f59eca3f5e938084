//! Domain model for the city guide.
//!
//! All types here are plain data: immutable once built, cheap to clone, and
//! serializable with the same field names the remote service uses.

pub mod geo;
pub mod macros;
pub mod route;
pub mod site;

pub use geo::*;
pub use route::*;
pub use site::*;
