//! Gridded array datasets for observation imports.
//!
//! [`GridDataset`] holds global attributes and named variables in memory and
//! implements [`ArraySource`], the read contract used by the array adapter.
//! With the `netcdf` feature, [`open_grid_dataset`] loads a NetCDF-4 file
//! through libnetcdf.

pub mod error;
pub mod grid;
pub mod native;

pub use error::{NetCdfError, NetCdfResult};
pub use grid::{ArraySource, Dimension, GridDataset, GridVariable, IndexIter};
pub use native::open_grid_dataset;

#[cfg(feature = "netcdf")]
pub use native::silence_hdf5_errors;
