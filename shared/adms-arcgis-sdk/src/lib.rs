//! ArcGIS REST SDK for the ADMS GIS workers
//!
//! Thin client over the ArcGIS Enterprise sharing and feature service REST
//! endpoints. Every remote call sits behind a trait in [`api`] so the
//! orchestration layer can run against in-memory fakes.

pub mod api;
mod error;
pub mod features;
pub mod geocode;
pub mod models;
pub mod portal;
mod rest;
mod retry;

pub use api::{find_item_by_title, find_or_create_folder, BoundaryLayer, PortalConnector, PortalSession};
pub use error::{ArcGisError, Result};
pub use features::PublicFeatureLayer;
pub use models::*;
pub use portal::{ArcGisPortal, ArcGisSession, Geocoder};
pub use rest::RestClient;
pub use retry::RetryPolicy;

/// Re-export for convenience
pub mod prelude {
    pub use super::api::*;
    pub use super::models::*;
    pub use super::{ArcGisError, Result};
}
