//! HTTP surface: upload page, JSON generate endpoints, markdown download and
//! health check.

pub mod endpoints;
pub mod error;
pub mod router;

pub use router::build_router;
