//! One source file paired with its mapping.
//!
//! An [`Extractor`] only names its source. The file is read when the source
//! is loaded, so a run holds no more files in memory than the current batch.

use import_common::{CheckMessage, ImportRecord};
use mapping::MappingConfig;
use netcdf_parser::GridDataset;
use serde_json::Value as Json;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::adapter::{ArrayAdapter, DocumentAdapter};
use crate::enumerate::{enumerate_array, enumerate_document};
use crate::error::{IngestionError, Result};
use crate::metadata::{self, MetadataAggregator};

/// Kind of source, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Gridded array file (NetCDF)
    Array,
    /// Nested key/list document (JSON)
    Document,
}

/// Detect the source kind from a path's extension.
pub fn detect_source_kind(path: impl AsRef<Path>) -> Option<SourceKind> {
    let extension = path.as_ref().extension()?.to_str()?.to_lowercase();
    match extension.as_str() {
        "nc" | "nc4" | "netcdf" => Some(SourceKind::Array),
        "json" => Some(SourceKind::Document),
        _ => None,
    }
}

/// Loaded contents of a source.
#[derive(Debug, Clone)]
pub enum SourceData {
    Array(GridDataset),
    Document(Json),
}

impl SourceData {
    fn read(path: &Path, kind: SourceKind) -> Result<Self> {
        Ok(match kind {
            SourceKind::Array => SourceData::Array(netcdf_parser::open_grid_dataset(path)?),
            SourceKind::Document => {
                let text = std::fs::read_to_string(path)?;
                SourceData::Document(serde_json::from_str(&text)?)
            }
        })
    }

    fn kind(&self) -> SourceKind {
        match self {
            SourceData::Array(_) => SourceKind::Array,
            SourceData::Document(_) => SourceKind::Document,
        }
    }
}

#[derive(Debug, Clone)]
enum Origin {
    File { path: PathBuf, kind: SourceKind },
    Memory(SourceData),
}

/// A source and the mapping used to extract records and reference entities from it.
#[derive(Debug, Clone)]
pub struct Extractor {
    name: String,
    origin: Origin,
    mapping: MappingConfig,
}

impl Extractor {
    /// Refer to a file, picking the adapter from its extension.
    ///
    /// Nothing is read until [`Extractor::load`].
    pub fn from_path(path: impl AsRef<Path>, mapping: MappingConfig) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let Some(kind) = detect_source_kind(path) else {
            return Err(IngestionError::UnknownFileType(name));
        };

        Ok(Self {
            name,
            origin: Origin::File {
                path: path.to_path_buf(),
                kind,
            },
            mapping,
        })
    }

    pub fn from_grid(name: impl Into<String>, grid: GridDataset, mapping: MappingConfig) -> Self {
        Self {
            name: name.into(),
            origin: Origin::Memory(SourceData::Array(grid)),
            mapping,
        }
    }

    pub fn from_document(name: impl Into<String>, document: Json, mapping: MappingConfig) -> Self {
        Self {
            name: name.into(),
            origin: Origin::Memory(SourceData::Document(document)),
            mapping,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SourceKind {
        match &self.origin {
            Origin::File { kind, .. } => *kind,
            Origin::Memory(data) => data.kind(),
        }
    }

    /// Read the source into memory. In-memory sources are borrowed.
    pub fn load(&self) -> Result<LoadedSource<'_>> {
        let data = match &self.origin {
            Origin::File { path, kind } => {
                let data = SourceData::read(path, *kind)?;
                debug!(source = %self.name, "Loaded source");
                Cow::Owned(data)
            }
            Origin::Memory(data) => Cow::Borrowed(data),
        };
        Ok(LoadedSource {
            name: &self.name,
            mapping: &self.mapping,
            data,
        })
    }

    /// Load the source and enumerate every record.
    pub fn extract(&self) -> Result<Vec<ImportRecord>> {
        self.load()?.extract()
    }
}

/// A source whose contents are in memory. Dropping it releases them.
#[derive(Debug)]
pub struct LoadedSource<'a> {
    name: &'a str,
    mapping: &'a MappingConfig,
    data: Cow<'a, SourceData>,
}

impl LoadedSource<'_> {
    pub fn name(&self) -> &str {
        self.name
    }

    /// Enumerate every record of the source.
    #[instrument(skip(self), fields(source = %self.name))]
    pub fn extract(&self) -> Result<Vec<ImportRecord>> {
        let records = match self.data.as_ref() {
            SourceData::Array(grid) => enumerate_array(grid, self.mapping)?,
            SourceData::Document(root) => enumerate_document(root, self.mapping)?,
        };
        info!(records = records.len(), "Extracted records");
        Ok(records)
    }

    /// Build the entities flagged by `messages` into `aggregator`.
    ///
    /// `records` are this source's records; message indices are relative to them.
    pub fn resolve_metadata(
        &self,
        records: &[ImportRecord],
        messages: &[CheckMessage],
        aggregator: &mut MetadataAggregator,
    ) -> Result<usize> {
        match self.data.as_ref() {
            SourceData::Array(grid) => metadata::resolve_metadata(
                &ArrayAdapter::new(grid),
                self.mapping,
                records,
                messages,
                aggregator,
            ),
            SourceData::Document(root) => metadata::resolve_metadata(
                &DocumentAdapter::new(root, self.mapping.import_path.as_deref()),
                self.mapping,
                records,
                messages,
                aggregator,
            ),
        }
    }
}
