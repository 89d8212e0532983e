//! Error types for the shared record schema.

use thiserror::Error;

/// Result type alias using SchemaError.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised when names do not match the record or entity schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Unknown import field: {0}")]
    UnknownField(String),

    #[error("Unknown entity kind: {0}")]
    UnknownEntityKind(String),
}
