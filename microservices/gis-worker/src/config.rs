//! Worker configuration

use adms_core::PortalConfig;
use std::env;

use crate::error::{Result, WorkerError};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub host: String,
    pub port: u16,
    pub portal: PortalConfig,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("FUNCTIONS_CUSTOMHANDLER_PORT") {
            Some(raw) => raw.trim().parse().map_err(|e| {
                WorkerError::Core(adms_core::AdmsError::Config(format!(
                    "Invalid FUNCTIONS_CUSTOMHANDLER_PORT: {}",
                    e
                )))
            })?,
            None => 8080,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            portal: PortalConfig::from_lookup(&lookup)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
