//! Record enumerators: walk a source's iteration domain and evaluate the
//! `import` template once per element.

use import_common::ImportRecord;
use mapping::{Evaluator, MappingConfig};
use netcdf_parser::{ArraySource, IndexIter};
use serde_json::Value as Json;
use tracing::debug;

use crate::adapter::{ArrayAdapter, ArrayCursor, DocumentAdapter};
use crate::error::{IngestionError, Result};

/// True when `value` lies in `[min, max)`. Missing bounds do not filter.
fn within_bounds(value: f64, (min, max): (Option<f64>, Option<f64>)) -> bool {
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value < max)
}

/// One record per unmasked, in-range element of every mapped parameter.
pub fn enumerate_array<A: ArraySource>(
    source: &A,
    mapping: &MappingConfig,
) -> Result<Vec<ImportRecord>> {
    let template = mapping.import_template()?;
    let adapter = ArrayAdapter::new(source);
    let mut records = Vec::new();

    for parameter in &mapping.parameters {
        let shape = source.variable_shape(parameter)?;
        let bounds = source.valid_bounds(parameter);
        let before = records.len();

        for indices in IndexIter::new(&shape) {
            let value = source.variable_value(parameter, &indices)?;
            if value.is_nan() || !within_bounds(value, bounds) {
                continue;
            }

            let cursor = ArrayCursor {
                parameter: parameter.clone(),
                indices,
                value,
            };
            let record = Evaluator::for_cursor(&adapter, &cursor)
                .build_record(&template)
                .map_err(|e| IngestionError::expression(records.len(), e))?;
            records.push(record);
        }

        debug!(
            parameter = %parameter,
            records = records.len() - before,
            "Enumerated parameter"
        );
    }

    Ok(records)
}

/// One record per row of the mapping's import-path list.
pub fn enumerate_document(root: &Json, mapping: &MappingConfig) -> Result<Vec<ImportRecord>> {
    let template = mapping.import_template()?;
    let adapter = DocumentAdapter::new(root, mapping.import_path.as_deref());
    let rows = adapter.rows()?;

    (0..rows.len())
        .map(|row| {
            Evaluator::for_cursor(&adapter, &row)
                .build_record(&template)
                .map_err(|e| IngestionError::expression(row, e))
        })
        .collect()
}
