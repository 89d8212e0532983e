//! Document adapter: `JSON <path>` over a parsed JSON document.
//!
//! Paths are dot-separated. A leading `$` segment stands for the current
//! row of the mapping's import-path list.

use import_common::Value;
use mapping::{AccessError, SourceAdapter};
use serde_json::Value as Json;
use thiserror::Error;

use super::expect_args;

/// Fractional digits used when document floats are stringified.
pub const DOCUMENT_FLOAT_DIGITS: usize = 30;

/// Why a path could not be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("key '{0}' not found")]
    MissingKey(String),

    #[error("list index '{0}' is not an integer")]
    NotAnIndex(String),

    #[error("list index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("cannot descend into a scalar with '{0}'")]
    NotContainer(String),
}

/// Walk `segments` from `value`. List segments must be integer indices.
pub fn resolve_path<'v, 's>(
    value: &'v Json,
    segments: impl IntoIterator<Item = &'s str>,
) -> Result<&'v Json, PathError> {
    let mut current = value;
    for segment in segments {
        current = match current {
            Json::Object(map) => map
                .get(segment)
                .ok_or_else(|| PathError::MissingKey(segment.to_string()))?,
            Json::Array(items) => {
                let index: usize = segment
                    .parse()
                    .map_err(|_| PathError::NotAnIndex(segment.to_string()))?;
                items.get(index).ok_or(PathError::OutOfRange {
                    index,
                    len: items.len(),
                })?
            }
            _ => return Err(PathError::NotContainer(segment.to_string())),
        };
    }
    Ok(current)
}

/// Why the import path does not give a list of rows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportPathError {
    #[error("mapping has no import_path")]
    Missing,

    #[error("import path '{path}': {source}")]
    Unresolved {
        path: String,
        #[source]
        source: PathError,
    },

    #[error("import path '{0}' is not a list")]
    NotAList(String),
}

pub struct DocumentAdapter<'a> {
    root: &'a Json,
    import_path: Option<&'a str>,
}

impl<'a> DocumentAdapter<'a> {
    pub fn new(root: &'a Json, import_path: Option<&'a str>) -> Self {
        Self { root, import_path }
    }

    /// Resolve the import path to the list of rows.
    pub fn rows(&self) -> Result<&'a [Json], ImportPathError> {
        let import_path = self.import_path.ok_or(ImportPathError::Missing)?;
        let rows = resolve_path(self.root, import_path.split('.')).map_err(|source| {
            ImportPathError::Unresolved {
                path: import_path.to_string(),
                source,
            }
        })?;
        rows.as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| ImportPathError::NotAList(import_path.to_string()))
    }

    fn lookup(&self, path: &str, row: Option<&usize>) -> Result<Value, AccessError> {
        let mut segments = path.split('.').peekable();

        let start = if segments.peek() == Some(&"$") {
            segments.next();
            let row = *row.ok_or(AccessError::OutOfContext)?;
            let rows = self.rows().map_err(|e| AccessError::Absent(e.to_string()))?;
            rows.get(row).ok_or_else(|| {
                AccessError::Absent(
                    PathError::OutOfRange {
                        index: row,
                        len: rows.len(),
                    }
                    .to_string(),
                )
            })?
        } else {
            self.root
        };

        let found = resolve_path(start, segments)
            .map_err(|e| AccessError::Absent(format!("{}: {}", path, e)))?;
        Value::from_json(found).ok_or_else(|| AccessError::Absent(format!("{} is null", path)))
    }
}

impl<'a> SourceAdapter for DocumentAdapter<'a> {
    /// Row index within the import-path list.
    type Cursor = usize;

    fn float_digits(&self) -> usize {
        DOCUMENT_FLOAT_DIGITS
    }

    fn read(&self, accessor: &str, args: &[&str], cursor: Option<&usize>) -> Result<Value, AccessError> {
        match accessor {
            "JSON" => {
                expect_args(args, 1)?;
                self.lookup(args[0], cursor)
            }
            _ => Err(AccessError::UnknownAccessor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapping::Evaluator;
    use serde_json::json;

    fn document() -> Json {
        json!({
            "meta": {"station": "Melbourne", "codes": ["086071", "086338"]},
            "observations": {
                "data": [
                    {"wmo": 94868, "air_temp": 14.5, "local_date_time_full": "20210815213000", "rain": null},
                    {"wmo": 94868, "air_temp": 13.25, "local_date_time_full": "20210815210000", "rain": "0.2"}
                ]
            }
        })
    }

    #[test]
    fn test_resolve_path_errors() {
        let doc = document();
        assert_eq!(
            resolve_path(&doc, "meta.codes.1".split('.')).unwrap(),
            &json!("086338")
        );
        assert_eq!(
            resolve_path(&doc, "meta.codes.x".split('.')),
            Err(PathError::NotAnIndex("x".into()))
        );
        assert_eq!(
            resolve_path(&doc, "meta.codes.5".split('.')),
            Err(PathError::OutOfRange { index: 5, len: 2 })
        );
        assert_eq!(
            resolve_path(&doc, "meta.missing".split('.')),
            Err(PathError::MissingKey("missing".into()))
        );
    }

    #[test]
    fn test_current_row_reference() {
        let doc = document();
        let adapter = DocumentAdapter::new(&doc, Some("observations.data"));
        let row = 1usize;
        let eval = Evaluator::for_cursor(&adapter, &row);
        assert_eq!(eval.evaluate("JSON $.air_temp !float").unwrap(), Value::Float(13.25));
        assert_eq!(eval.evaluate("JSON $.wmo").unwrap(), Value::from("94868"));
        assert_eq!(eval.evaluate("JSON meta.station").unwrap(), Value::from("Melbourne"));
        assert_eq!(
            eval.evaluate("JSON $.local_date_time_full !datetime:bom_date_time_full:json")
                .unwrap(),
            Value::from("2021-08-15T21:00:00")
        );
    }

    #[test]
    fn test_float_renders_thirty_digits() {
        let doc = document();
        let adapter = DocumentAdapter::new(&doc, Some("observations.data"));
        let row = 0usize;
        let eval = Evaluator::for_cursor(&adapter, &row);
        let text = eval.evaluate("JSON $.air_temp").unwrap();
        assert_eq!(text, Value::from(format!("14.5{}", "0".repeat(29))));
    }

    #[test]
    fn test_null_is_absent_and_falls_through() {
        let doc = document();
        let adapter = DocumentAdapter::new(&doc, Some("observations.data"));
        let row = 0usize;
        let eval = Evaluator::for_cursor(&adapter, &row);
        assert!(matches!(
            eval.evaluate("JSON $.rain").unwrap_err().reason,
            AccessError::Absent(_)
        ));
        assert_eq!(eval.evaluate("JSON $.rain|CONST 0").unwrap(), Value::from("0"));
    }

    #[test]
    fn test_row_reference_needs_cursor() {
        use import_common::ImportRecord;
        let doc = document();
        let adapter = DocumentAdapter::new(&doc, Some("observations.data"));
        let record = ImportRecord::new();
        let eval = Evaluator::for_record(&adapter, &record);
        assert_eq!(
            eval.evaluate("JSON $.wmo").unwrap_err().reason,
            AccessError::OutOfContext
        );
        assert_eq!(eval.evaluate("JSON meta.codes.0").unwrap(), Value::from("086071"));
    }

    #[test]
    fn test_rows_requires_list() {
        let doc = document();
        assert_eq!(
            DocumentAdapter::new(&doc, Some("meta.station")).rows(),
            Err(ImportPathError::NotAList("meta.station".to_string()))
        );
        assert_eq!(
            DocumentAdapter::new(&doc, None).rows(),
            Err(ImportPathError::Missing)
        );
        assert_eq!(
            DocumentAdapter::new(&doc, Some("observations.missing")).rows(),
            Err(ImportPathError::Unresolved {
                path: "observations.missing".to_string(),
                source: PathError::MissingKey("missing".to_string()),
            })
        );
        assert_eq!(
            DocumentAdapter::new(&doc, Some("observations.data"))
                .rows()
                .unwrap()
                .len(),
            2
        );
    }
}
