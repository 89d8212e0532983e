//! Error types for import service calls.

use thiserror::Error;

/// Result type alias using ServiceError.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode service response: {0}")]
    Decode(#[from] serde_json::Error),
}
