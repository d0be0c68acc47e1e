//! GIS Worker
//!
//! Queue-driven workers for ADMS missions and tickets:
//! - `create_mission_fs`: hosted feature service per mission
//! - `add_tickets_to_featurelayer`: geocoded ticket features, deduplicated
//! - `update_ticket_in_featurelayer`: relocate or edit a stored ticket
//! - `edit_mission_definition`: service and layer definition changes
//!
//! Runs as an Azure Functions custom handler, or replays message files from
//! a directory.

pub mod config;
pub mod error;
pub mod functions;
pub mod handlers;
pub mod invocation;
pub mod metrics;
pub mod missions;
pub mod replay;
pub mod tickets;

use adms_arcgis_sdk::{BoundaryLayer, PortalConnector};
use adms_core::HostingEnv;
use std::sync::Arc;

pub use config::WorkerConfig;
pub use error::{Result, WorkerError};
pub use functions::{dispatch, WorkerFunction};
pub use metrics::WorkerMetrics;

/// Shared dependencies of every invocation
#[derive(Clone)]
pub struct WorkerContext {
    pub portal: Arc<dyn PortalConnector>,
    pub boundaries: Arc<dyn BoundaryLayer>,
    pub env: HostingEnv,
    pub metrics: WorkerMetrics,
}

impl WorkerContext {
    pub fn new(
        portal: Arc<dyn PortalConnector>,
        boundaries: Arc<dyn BoundaryLayer>,
        env: HostingEnv,
    ) -> Self {
        Self {
            portal,
            boundaries,
            env,
            metrics: WorkerMetrics::new(),
        }
    }
}

/// How a message finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed(String),
    /// Nothing to do; the message is consumed
    Skipped(String),
}

impl Outcome {
    pub fn detail(&self) -> &str {
        match self {
            Self::Completed(d) | Self::Skipped(d) => d,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}
