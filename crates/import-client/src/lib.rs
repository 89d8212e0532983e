//! Client side of the remote validation/import service.
//!
//! [`ImportService`] is the contract the ingestion pipeline drives;
//! [`HttpImportService`] implements it over the REST API.

pub mod endpoints;
pub mod error;
pub mod http;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use http::{HttpImportService, ServiceConfig, DEFAULT_HOST, DEFAULT_TIMEOUT_SECS};
pub use service::ImportService;
