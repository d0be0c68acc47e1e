//! ADMS Core - Shared domain types for the GIS workers
//!
//! This crate provides:
//! - Error handling utilities
//! - Portal configuration loaded from the environment
//! - Feature service naming rules
//! - Geometry helpers (GPS parsing, extent reduction)
//! - Typed queue message schemas and the ticket record mapper
//! - The tickets layer definition

pub mod config;
pub mod error;
pub mod geometry;
pub mod layer;
pub mod locality;
pub mod message;
pub mod naming;
pub mod ticket;
pub mod timestamp;

mod lenient;

pub use config::PortalConfig;
pub use error::{AdmsError, Result};
pub use geometry::{Coordinates, Extent, Point, Polygon, SpatialReference};
pub use locality::Locality;
pub use message::{MissionEditMessage, MissionMessage, TicketMessage, TicketUpdateMessage};
pub use naming::HostingEnv;
pub use ticket::{map_ticket, TicketAttributes, TicketFeature};
