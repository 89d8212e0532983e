//! Error types for mapping configuration and expression evaluation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using MappingError.
pub type MappingResult<T> = Result<T, MappingError>;

/// Errors loading or querying a mapping configuration.
#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Failed to read mapping {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid mapping JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The `import` template names a field outside the record schema.
    #[error("Import template references unknown field: {0}")]
    UnknownField(String),

    #[error("Mapping has no '{0}' template")]
    MissingTemplate(String),
}

/// Why a single alt could not be evaluated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessError {
    #[error("unknown accessor")]
    UnknownAccessor,

    #[error("expected {expected} argument(s), got {actual}")]
    Arity { expected: usize, actual: usize },

    #[error("accessor cannot be used in this context")]
    OutOfContext,

    #[error("value not found: {0}")]
    Absent(String),

    #[error("cannot convert '{value}' to {target}")]
    Conversion { value: String, target: String },

    #[error("unknown value type: {0}")]
    UnknownType(String),

    #[error("unbalanced parentheses")]
    Unbalanced,
}

/// An expression failed; carries the last alt tried and its accessor.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("failed to evaluate '{alt}' ({accessor}): {reason}")]
pub struct ExpressionError {
    pub alt: String,
    pub accessor: String,
    pub reason: AccessError,
}

impl ExpressionError {
    pub fn new(alt: impl Into<String>, accessor: impl Into<String>, reason: AccessError) -> Self {
        Self {
            alt: alt.into(),
            accessor: accessor.into(),
            reason,
        }
    }
}

/// A template entry had no surviving alt.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("field '{field}': {source}")]
pub struct FieldError {
    pub field: String,
    #[source]
    pub source: ExpressionError,
}
