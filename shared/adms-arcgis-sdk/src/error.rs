//! Error types for ArcGIS REST calls

/// Result type alias
pub type Result<T> = std::result::Result<T, ArcGisError>;

/// ArcGIS SDK errors
#[derive(Debug, thiserror::Error)]
pub enum ArcGisError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API error {code}: {message} {details:?}")]
    Api {
        code: i64,
        message: String,
        details: Vec<String>,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl ArcGisError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Api { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for ArcGisError {
    fn from(err: serde_json::Error) -> Self {
        ArcGisError::Decode(err.to_string())
    }
}
