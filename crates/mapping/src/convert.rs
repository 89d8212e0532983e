//! Type suffixes (`!str`, `!str:N`, `!float`, `!datetime:...`).

use import_common::Value;

use crate::error::AccessError;
use crate::time::{TimeConverter, TimeFormatter};

/// Target type of an alt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Stringify, optionally keeping only the first N characters.
    Str(Option<usize>),
    Float,
    DateTime {
        converter: TimeConverter,
        formatter: Option<TimeFormatter>,
    },
}

impl Default for ValueType {
    fn default() -> Self {
        ValueType::Str(None)
    }
}

impl ValueType {
    pub fn parse(type_name: &str) -> Result<Self, AccessError> {
        let unknown = || AccessError::UnknownType(type_name.to_string());
        let mut parts = type_name.split(':');

        match parts.next().unwrap_or_default() {
            "str" => match (parts.next(), parts.next()) {
                (None, _) => Ok(ValueType::Str(None)),
                (Some(n), None) => n
                    .parse()
                    .map(|n| ValueType::Str(Some(n)))
                    .map_err(|_| unknown()),
                _ => Err(unknown()),
            },
            "float" if parts.next().is_none() => Ok(ValueType::Float),
            "datetime" => {
                let converter = parts
                    .next()
                    .and_then(TimeConverter::from_name)
                    .ok_or_else(unknown)?;
                let formatter = match parts.next() {
                    None => None,
                    Some(name) => Some(TimeFormatter::from_name(name).ok_or_else(unknown)?),
                };
                if parts.next().is_some() {
                    return Err(unknown());
                }
                Ok(ValueType::DateTime {
                    converter,
                    formatter,
                })
            }
            _ => Err(unknown()),
        }
    }

    /// Coerce a raw value. `float_digits` controls float rendering for `str`.
    pub fn apply(&self, value: Value, float_digits: usize) -> Result<Value, AccessError> {
        match self {
            ValueType::Str(limit) => {
                let text = value.render(float_digits);
                Ok(Value::Text(match limit {
                    Some(n) => text.chars().take(*n).collect(),
                    None => text,
                }))
            }
            ValueType::Float => match &value {
                Value::DateTime(_) => Err(not_numeric(&value)),
                other => other.as_f64().map(Value::Float).ok_or_else(|| not_numeric(&value)),
            },
            ValueType::DateTime {
                converter,
                formatter,
            } => {
                let dt = converter.convert(&value)?;
                Ok(match formatter {
                    Some(f) => Value::Text(f.format(&dt)),
                    None => Value::DateTime(dt),
                })
            }
        }
    }
}

fn not_numeric(value: &Value) -> AccessError {
    AccessError::Conversion {
        value: value.to_string(),
        target: "float".to_string(),
    }
}
