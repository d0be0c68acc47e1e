//! Error types for the GIS worker

use adms_arcgis_sdk::ArcGisError;
use adms_core::AdmsError;
use axum::http::StatusCode;

/// Result type alias
pub type Result<T> = std::result::Result<T, WorkerError>;

/// GIS worker errors
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error(transparent)]
    Core(#[from] AdmsError),

    #[error("Platform error: {0}")]
    Platform(#[from] ArcGisError),

    #[error("Edit rejected: {0}")]
    EditRejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    /// Status returned to the Functions host; 4xx means the message itself is bad.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidMessage(_) => StatusCode::BAD_REQUEST,
            Self::Core(AdmsError::Serialization(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for WorkerError {
    fn from(err: serde_json::Error) -> Self {
        WorkerError::InvalidMessage(err.to_string())
    }
}

/// A required message field, trimmed and non-empty
pub(crate) fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| WorkerError::InvalidMessage(format!("{} is required", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            WorkerError::InvalidMessage("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WorkerError::Platform(ArcGisError::Unauthorized("expired".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            WorkerError::Core(AdmsError::Serialization("bad".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WorkerError::Core(AdmsError::Config("missing".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_required_field() {
        assert_eq!(required(Some(" St-Mary "), "missionName").unwrap(), "St-Mary");
        assert!(required(Some("  "), "missionName").is_err());
        assert!(required(None, "missionName").is_err());
    }
}
