//! Feature service naming rules

use serde::{Deserialize, Serialize};
use std::fmt;

const BLOB_NAME_SPLITTER: char = '-';
const FS_NAME_SPLITTER: char = '_';

/// Hosting environment tag (`DEV`, `QA`, `PROD`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostingEnv(String);

impl HostingEnv {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_production(&self) -> bool {
        self.0 == "PROD"
    }

    /// Portal folder holding every mission service of this environment
    pub fn portal_folder(&self) -> String {
        format!("ADMS-{}", self.0)
    }
}

impl fmt::Display for HostingEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mission names arrive blob-style (`St-Mary-2024`); service names use underscores.
pub fn sanitize_fs_name(mission_name: &str) -> String {
    mission_name.replace(BLOB_NAME_SPLITTER, &FS_NAME_SPLITTER.to_string())
}

/// Non-production services carry the environment as a suffix.
pub fn unique_fs_name_per_env(fs_name: &str, env: &HostingEnv) -> String {
    if env.is_production() {
        fs_name.to_string()
    } else {
        format!("{}_{}", fs_name, env)
    }
}

/// Full feature service name for a mission in an environment.
pub fn mission_service_name(mission_name: &str, env: &HostingEnv) -> String {
    unique_fs_name_per_env(&sanitize_fs_name(mission_name), env)
}
