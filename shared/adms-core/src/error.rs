//! Error types for ADMS domain logic

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdmsError>;

#[derive(Error, Debug)]
pub enum AdmsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid GPS coordinates: {0}")]
    InvalidGps(String),

    #[error("Empty geometry: {0}")]
    EmptyGeometry(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AdmsError {
    fn from(err: serde_json::Error) -> Self {
        AdmsError::Serialization(err.to_string())
    }
}
