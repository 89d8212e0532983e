//! Array adapter: `ATTR`, `VARATTR`, `PARAM` and `VAR` over an [`ArraySource`].

use import_common::Value;
use mapping::{AccessError, SourceAdapter};
use netcdf_parser::ArraySource;

use super::expect_args;

/// Fractional digits used when array floats are stringified.
pub const ARRAY_FLOAT_DIGITS: usize = 8;

/// The parameter element currently being enumerated.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayCursor {
    pub parameter: String,
    pub indices: Vec<usize>,
    pub value: f64,
}

pub struct ArrayAdapter<'a, A: ArraySource> {
    source: &'a A,
}

impl<'a, A: ArraySource> ArrayAdapter<'a, A> {
    pub fn new(source: &'a A) -> Self {
        Self { source }
    }

    /// Value of `target` at the indices it shares with the cursor's parameter.
    fn shared_value(&self, target: &str, cursor: &ArrayCursor) -> Result<Value, AccessError> {
        let absent = |e: netcdf_parser::NetCdfError| AccessError::Absent(e.to_string());

        let parameter_dims = self
            .source
            .variable_dimensions(&cursor.parameter)
            .map_err(absent)?;
        let target_dims = self.source.variable_dimensions(target).map_err(absent)?;

        let indices = target_dims
            .iter()
            .map(|dim| {
                parameter_dims
                    .iter()
                    .position(|d| d == dim)
                    .and_then(|pos| cursor.indices.get(pos).copied())
                    .ok_or_else(|| {
                        AccessError::Absent(format!(
                            "dimension {} of {} is not shared with {}",
                            dim, target, cursor.parameter
                        ))
                    })
            })
            .collect::<Result<Vec<usize>, AccessError>>()?;

        let value = self
            .source
            .variable_value(target, &indices)
            .map_err(absent)?;
        if value.is_nan() {
            return Err(AccessError::Absent(format!("{} is masked", target)));
        }
        Ok(Value::Float(value))
    }
}

impl<'a, A: ArraySource> SourceAdapter for ArrayAdapter<'a, A> {
    type Cursor = ArrayCursor;

    fn float_digits(&self) -> usize {
        ARRAY_FLOAT_DIGITS
    }

    fn read(
        &self,
        accessor: &str,
        args: &[&str],
        cursor: Option<&ArrayCursor>,
    ) -> Result<Value, AccessError> {
        match accessor {
            "ATTR" => {
                expect_args(args, 1)?;
                self.source
                    .attribute(args[0])
                    .map_err(|e| AccessError::Absent(e.to_string()))
            }
            "VARATTR" => {
                expect_args(args, 2)?;
                self.source
                    .variable_attribute(args[0], args[1])
                    .map_err(|e| AccessError::Absent(e.to_string()))
            }
            "PARAM" => {
                expect_args(args, 1)?;
                let cursor = cursor.ok_or(AccessError::OutOfContext)?;
                match args[0] {
                    "name" => Ok(Value::Text(cursor.parameter.clone())),
                    "value" => Ok(Value::Float(cursor.value)),
                    other => Err(AccessError::Absent(format!("PARAM {}", other))),
                }
            }
            "VAR" => {
                expect_args(args, 1)?;
                let cursor = cursor.ok_or(AccessError::OutOfContext)?;
                self.shared_value(args[0], cursor)
            }
            _ => Err(AccessError::UnknownAccessor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapping::Evaluator;
    use netcdf_parser::{Dimension, GridDataset, GridVariable};

    fn dim(name: &str, len: usize) -> Dimension {
        Dimension {
            name: name.to_string(),
            len,
        }
    }

    fn dataset() -> GridDataset {
        GridDataset::new()
            .with_attribute("site_code", "PPB01")
            .with_variable(
                GridVariable::new(
                    "TEMP",
                    vec![dim("TIME", 2), dim("DEPTH", 3)],
                    vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
                )
                .unwrap()
                .with_attribute("units", "Celsius"),
            )
            .with_variable(GridVariable::new("TIME", vec![dim("TIME", 2)], vec![25567.0, 25568.5]).unwrap())
            .with_variable(GridVariable::new("DEPTH", vec![dim("DEPTH", 3)], vec![0.5, 1.0, f64::NAN]).unwrap())
            .with_variable(GridVariable::new("LAT", vec![dim("LATITUDE", 1)], vec![-38.1]).unwrap())
            .with_variable(GridVariable::scalar("NOMINAL_DEPTH", 2.0))
    }

    fn cursor(indices: Vec<usize>, value: f64) -> ArrayCursor {
        ArrayCursor {
            parameter: "TEMP".to_string(),
            indices,
            value,
        }
    }

    #[test]
    fn test_attr_and_varattr() {
        let ds = dataset();
        let adapter = ArrayAdapter::new(&ds);
        let c = cursor(vec![0, 0], 1.0);
        let eval = Evaluator::for_cursor(&adapter, &c);
        assert_eq!(eval.evaluate("ATTR site_code").unwrap(), Value::from("PPB01"));
        assert_eq!(
            eval.evaluate("VARATTR TEMP units").unwrap(),
            Value::from("Celsius")
        );
        let err = eval.evaluate("VARATTR TEMP").unwrap_err();
        assert_eq!(err.reason, AccessError::Arity { expected: 2, actual: 1 });
    }

    #[test]
    fn test_param_name_and_value() {
        let ds = dataset();
        let adapter = ArrayAdapter::new(&ds);
        let c = cursor(vec![1, 2], 6.0);
        let eval = Evaluator::for_cursor(&adapter, &c);
        assert_eq!(eval.evaluate("PARAM name").unwrap(), Value::from("TEMP"));
        assert_eq!(eval.evaluate("PARAM value").unwrap(), Value::from("6.00000000"));
        assert_eq!(eval.evaluate("PARAM value !float").unwrap(), Value::Float(6.0));
    }

    #[test]
    fn test_var_uses_shared_dimensions() {
        let ds = dataset();
        let adapter = ArrayAdapter::new(&ds);
        let c = cursor(vec![1, 0], 4.0);
        let eval = Evaluator::for_cursor(&adapter, &c);
        assert_eq!(
            eval.evaluate("VAR TIME !datetime:days_since_1950:json").unwrap(),
            Value::from("2020-01-02T12:00:00")
        );
        assert_eq!(eval.evaluate("VAR DEPTH !float").unwrap(), Value::Float(0.5));
        assert_eq!(eval.evaluate("VAR NOMINAL_DEPTH !float").unwrap(), Value::Float(2.0));
    }

    #[test]
    fn test_var_unshared_or_masked_is_absent() {
        let ds = dataset();
        let adapter = ArrayAdapter::new(&ds);
        let c = cursor(vec![0, 2], 3.0);
        let eval = Evaluator::for_cursor(&adapter, &c);
        assert!(matches!(
            eval.evaluate("VAR LAT").unwrap_err().reason,
            AccessError::Absent(_)
        ));
        assert!(matches!(
            eval.evaluate("VAR DEPTH").unwrap_err().reason,
            AccessError::Absent(_)
        ));
        assert_eq!(eval.evaluate("VAR DEPTH|CONST surface").unwrap(), Value::from("surface"));
    }

    #[test]
    fn test_cursor_accessors_out_of_context() {
        use import_common::ImportRecord;
        let ds = dataset();
        let adapter = ArrayAdapter::new(&ds);
        let record = ImportRecord::new();
        let eval = Evaluator::for_record(&adapter, &record);
        assert_eq!(
            eval.evaluate("PARAM name").unwrap_err().reason,
            AccessError::OutOfContext
        );
        assert_eq!(eval.evaluate("ATTR site_code").unwrap(), Value::from("PPB01"));
    }
}
