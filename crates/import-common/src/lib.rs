//! Common types shared across the observation importer crates.
//!
//! - [`Value`]: scalar values produced by the mapping evaluator
//! - [`ImportRecord`]: one flattened row destined for the import service
//! - [`EntityKind`] / [`ReferenceEntity`]: deduplicated descriptive objects
//! - [`CheckResults`] / [`CheckMessage`]: validation feedback addressed by record index

pub mod check;
pub mod entity;
pub mod error;
pub mod record;
pub mod value;

pub use check::{CheckMessage, CheckResults, CheckStage, CheckStatus, ImportRunResult};
pub use entity::{EntityKind, ReferenceEntity, MARKER_RULES};
pub use error::{SchemaError, SchemaResult};
pub use record::{ImportField, ImportRecord};
pub use value::{Value, DATETIME_FORMAT};
