//! Expression evaluation against a source adapter.

use import_common::{ImportField, ImportRecord, ReferenceEntity, Value};
use tracing::trace;

use crate::config::Template;
use crate::convert::ValueType;
use crate::error::{AccessError, ExpressionError, FieldError};
use crate::expression::{split_alts, substitute_groups, Alt};

/// Read access to a data source, exposed to expressions through accessors.
pub trait SourceAdapter {
    /// Position of the element currently being enumerated.
    type Cursor;

    /// Fractional digits used when a float is stringified.
    fn float_digits(&self) -> usize;

    /// Resolve a source-specific accessor.
    ///
    /// Returns [`AccessError::UnknownAccessor`] for names the adapter does not handle.
    fn read(
        &self,
        accessor: &str,
        args: &[&str],
        cursor: Option<&Self::Cursor>,
    ) -> Result<Value, AccessError>;
}

/// Evaluates expressions in one context: a source plus either an
/// enumeration cursor (import template) or a finished record (entity templates).
pub struct Evaluator<'a, S: SourceAdapter> {
    source: &'a S,
    cursor: Option<&'a S::Cursor>,
    record: Option<&'a ImportRecord>,
}

impl<'a, S: SourceAdapter> Evaluator<'a, S> {
    pub fn for_cursor(source: &'a S, cursor: &'a S::Cursor) -> Self {
        Self {
            source,
            cursor: Some(cursor),
            record: None,
        }
    }

    pub fn for_record(source: &'a S, record: &'a ImportRecord) -> Self {
        Self {
            source,
            cursor: None,
            record: Some(record),
        }
    }

    /// Evaluate a full expression. The first alt that succeeds wins;
    /// otherwise the error of the last alt is returned.
    pub fn evaluate(&self, expr: &str) -> Result<Value, ExpressionError> {
        let mut last_error = None;

        for alt in split_alts(expr) {
            match self.evaluate_alt(alt) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    trace!(alt = %alt, error = %e, "Alt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ExpressionError::new(expr, "", AccessError::Absent(expr.into()))))
    }

    fn evaluate_alt(&self, alt: &str) -> Result<Value, ExpressionError> {
        let alt = alt.trim();
        if alt.is_empty() {
            return Ok(Value::Text(String::new()));
        }

        let digits = self.source.float_digits();
        let resolved = substitute_groups(alt, |inner| {
            self.evaluate(inner).map(|v| v.render(digits))
        })?;

        let parsed = Alt::parse(&resolved);
        let fail = |reason| ExpressionError::new(alt, parsed.accessor, reason);

        let value_type = ValueType::parse(parsed.value_type).map_err(fail)?;
        let raw = match parsed.accessor {
            "CONST" => Ok(Value::Text(parsed.args.join(" "))),
            "FIELD" => self.read_field(&parsed.args),
            accessor => self.source.read(accessor, &parsed.args, self.cursor),
        }
        .map_err(fail)?;

        value_type.apply(raw, digits).map_err(fail)
    }

    fn read_field(&self, args: &[&str]) -> Result<Value, AccessError> {
        if args.len() != 1 {
            return Err(AccessError::Arity {
                expected: 1,
                actual: args.len(),
            });
        }
        let record = self.record.ok_or(AccessError::OutOfContext)?;
        record
            .get_by_name(args[0])
            .cloned()
            .ok_or_else(|| AccessError::Absent(args[0].to_string()))
    }

    /// Build an import record from `(field, expression)` pairs.
    pub fn build_record(&self, entries: &[(ImportField, &str)]) -> Result<ImportRecord, FieldError> {
        entries
            .iter()
            .map(|(field, expr)| {
                self.evaluate(expr)
                    .map(|value| (*field, value))
                    .map_err(|source| FieldError {
                        field: field.as_str().to_string(),
                        source,
                    })
            })
            .collect()
    }

    /// Build a reference entity from a metadata template.
    pub fn build_entity(&self, template: &Template) -> Result<ReferenceEntity, FieldError> {
        let mut entity = ReferenceEntity::new();
        for (name, expr) in template.entries() {
            let value = self.evaluate(expr).map_err(|source| FieldError {
                field: name.clone(),
                source,
            })?;
            entity.attributes.insert(name.clone(), value);
        }
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Adapter exposing `KEY <name>` over a flat map; cursor is a row label.
    struct MapSource {
        values: HashMap<&'static str, Value>,
    }

    impl SourceAdapter for MapSource {
        type Cursor = String;

        fn float_digits(&self) -> usize {
            2
        }

        fn read(
            &self,
            accessor: &str,
            args: &[&str],
            cursor: Option<&String>,
        ) -> Result<Value, AccessError> {
            match accessor {
                "KEY" => self
                    .values
                    .get(args.first().copied().unwrap_or_default())
                    .cloned()
                    .ok_or_else(|| AccessError::Absent(args.join(" "))),
                "ROW" => cursor
                    .map(|c| Value::Text(c.clone()))
                    .ok_or(AccessError::OutOfContext),
                _ => Err(AccessError::UnknownAccessor),
            }
        }
    }

    fn source() -> MapSource {
        let mut values = HashMap::new();
        values.insert("depth", Value::Float(1.5));
        values.insert("site", Value::from("S1"));
        values.insert("count", Value::Integer(3));
        MapSource { values }
    }

    #[test]
    fn test_first_successful_alt_wins() {
        let src = source();
        let cursor = "r0".to_string();
        let eval = Evaluator::for_cursor(&src, &cursor);
        assert_eq!(eval.evaluate("KEY missing|KEY site").unwrap(), Value::from("S1"));
        assert_eq!(eval.evaluate("KEY site|KEY depth").unwrap(), Value::from("S1"));
    }

    #[test]
    fn test_all_alts_fail_reports_last() {
        let src = source();
        let cursor = "r0".to_string();
        let eval = Evaluator::for_cursor(&src, &cursor);
        let err = eval.evaluate("KEY missing|NOPE x").unwrap_err();
        assert_eq!(err.accessor, "NOPE");
        assert_eq!(err.reason, AccessError::UnknownAccessor);
    }

    #[test]
    fn test_float_rendering_uses_adapter_digits() {
        let src = source();
        let cursor = "r0".to_string();
        let eval = Evaluator::for_cursor(&src, &cursor);
        assert_eq!(eval.evaluate("KEY depth").unwrap(), Value::from("1.50"));
        assert_eq!(eval.evaluate("KEY depth !float").unwrap(), Value::Float(1.5));
        assert_eq!(eval.evaluate("KEY count").unwrap(), Value::from("3"));
    }

    #[test]
    fn test_group_substitution() {
        let src = source();
        let cursor = "r7".to_string();
        let eval = Evaluator::for_cursor(&src, &cursor);
        assert_eq!(
            eval.evaluate("CONST (KEY site)-(ROW)").unwrap(),
            Value::from("S1-r7")
        );
        assert_eq!(
            eval.evaluate("KEY (CONST site)").unwrap(),
            Value::from("S1")
        );
    }

    #[test]
    fn test_nested_alts_inside_group() {
        let src = source();
        let cursor = "r0".to_string();
        let eval = Evaluator::for_cursor(&src, &cursor);
        assert_eq!(
            eval.evaluate("CONST at (KEY nope|KEY depth !str:3)").unwrap(),
            Value::from("at 1.5")
        );
    }

    #[test]
    fn test_empty_alt_is_empty_text() {
        let src = source();
        let cursor = "r0".to_string();
        let eval = Evaluator::for_cursor(&src, &cursor);
        assert_eq!(eval.evaluate("KEY nope|").unwrap(), Value::from(""));
        assert_eq!(eval.evaluate("   ").unwrap(), Value::from(""));
    }

    #[test]
    fn test_field_requires_record() {
        let src = source();
        let cursor = "r0".to_string();
        let eval = Evaluator::for_cursor(&src, &cursor);
        let err = eval.evaluate("FIELD site_code").unwrap_err();
        assert_eq!(err.reason, AccessError::OutOfContext);

        let record = ImportRecord::new().with(ImportField::SiteCode, "S9");
        let eval = Evaluator::for_record(&src, &record);
        assert_eq!(eval.evaluate("FIELD site_code").unwrap(), Value::from("S9"));
        assert!(matches!(
            eval.evaluate("FIELD").unwrap_err().reason,
            AccessError::Arity { expected: 1, actual: 0 }
        ));
        assert!(matches!(
            eval.evaluate("ROW").unwrap_err().reason,
            AccessError::OutOfContext
        ));
    }

    #[test]
    fn test_unbalanced_is_error() {
        let src = source();
        let cursor = "r0".to_string();
        let eval = Evaluator::for_cursor(&src, &cursor);
        let err = eval.evaluate("CONST (KEY site").unwrap_err();
        assert_eq!(err.reason, AccessError::Unbalanced);
    }

    #[test]
    fn test_build_record_reports_field() {
        let src = source();
        let cursor = "r0".to_string();
        let eval = Evaluator::for_cursor(&src, &cursor);
        let record = eval
            .build_record(&[
                (ImportField::SiteCode, "KEY site"),
                (ImportField::Value, "KEY depth !float"),
            ])
            .unwrap();
        assert_eq!(record.get(ImportField::Value), Some(&Value::Float(1.5)));

        let err = eval
            .build_record(&[(ImportField::Parameter, "KEY nope")])
            .unwrap_err();
        assert_eq!(err.field, "parameter");
    }
}
