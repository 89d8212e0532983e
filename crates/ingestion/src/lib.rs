//! Observation ingestion library.
//!
//! Turns gridded array files and nested JSON documents into import records
//! and reference entities, and drives them through an [`ImportService`].
//!
//! # Architecture
//!
//! - [`adapter`]: exposes a loaded source to the mapping evaluator
//! - [`enumerate`]: one record per array element or document row
//! - [`metadata`]: aggregates entities flagged by validation messages and
//!   creates them remotely
//! - [`dedup`]: duplicate suppression passes
//! - [`batch`]: batching, index-window remapping and submission
//!
//! [`ImportService`]: import_client::ImportService

pub mod adapter;
pub mod batch;
pub mod config;
pub mod dedup;
pub mod enumerate;
pub mod error;
pub mod extractor;
pub mod metadata;

// Re-exports
pub use batch::{plan_batches, BatchController, ImportSummary};
pub use config::{ImportOptions, DEFAULT_BATCH_SIZE};
pub use dedup::{remove_duplicates, remove_zero_duplicates};
pub use enumerate::{enumerate_array, enumerate_document};
pub use error::{IngestionError, Result};
pub use extractor::{detect_source_kind, Extractor, LoadedSource, SourceData, SourceKind};
pub use metadata::{create_metadata, resolve_metadata, MetadataAggregator, MetadataSummary};
