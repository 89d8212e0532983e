//! Error types for gridded dataset access.

use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing and grid access.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing variable or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Index tuple does not address an element of the variable
    #[error("Index {indices:?} out of bounds for {variable} with shape {shape:?}")]
    IndexOutOfBounds {
        variable: String,
        indices: Vec<usize>,
        shape: Vec<usize>,
    },

    /// Built without the `netcdf` feature
    #[error("Unsupported: {0}")]
    Unsupported(String),
}
