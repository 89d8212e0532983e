//! Error types for the ingestion crate.

use import_common::CheckMessage;
use thiserror::Error;

use crate::adapter::ImportPathError;

/// Errors that can occur while extracting or importing records.
#[derive(Error, Debug)]
pub enum IngestionError {
    /// A template entry had no surviving alt.
    #[error("Failed to evaluate field '{field}' of record {record}: {source}")]
    Expression {
        field: String,
        record: usize,
        #[source]
        source: mapping::ExpressionError,
    },

    /// The import path does not resolve to a list of rows.
    #[error("Invalid source format: {0}")]
    SourceFormat(#[from] ImportPathError),

    /// The service reported error messages that nothing here handles.
    #[error("Unhandled import check errors ({} error message(s))", .messages.len())]
    ValidationService { messages: Vec<CheckMessage> },

    #[error("Import service error: {0}")]
    Service(#[from] import_client::ServiceError),

    #[error("Failed to read array source: {0}")]
    NetCdf(#[from] netcdf_parser::NetCdfError),

    #[error("Mapping error: {0}")]
    Mapping(#[from] mapping::MappingError),

    #[error("Unknown file type: {0}")]
    UnknownFileType(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
}

impl IngestionError {
    /// Attach the record position to a template evaluation failure.
    pub fn expression(record: usize, error: mapping::FieldError) -> Self {
        IngestionError::Expression {
            field: error.field,
            record,
            source: error.source,
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;
