//! The flat import record schema.

use crate::error::SchemaError;
use crate::value::Value;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Fixed field names of an import record, ordered as the service schema lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImportField {
    SiteCode,
    Date,
    Program,
    VariantType,
    VariantDateTime,
    VariantValue,
    VariantComment,
    Parameter,
    Value,
    Quality,
    Laboratory,
    SamplingMethod,
}

impl ImportField {
    pub const ALL: [ImportField; 12] = [
        ImportField::SiteCode,
        ImportField::Date,
        ImportField::Program,
        ImportField::VariantType,
        ImportField::VariantDateTime,
        ImportField::VariantValue,
        ImportField::VariantComment,
        ImportField::Parameter,
        ImportField::Value,
        ImportField::Quality,
        ImportField::Laboratory,
        ImportField::SamplingMethod,
    ];

    /// Fields that together identify one observation for duplicate detection.
    pub const IDENTITY: [ImportField; 8] = [
        ImportField::SiteCode,
        ImportField::Date,
        ImportField::Program,
        ImportField::VariantType,
        ImportField::VariantDateTime,
        ImportField::VariantValue,
        ImportField::VariantComment,
        ImportField::Parameter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportField::SiteCode => "site_code",
            ImportField::Date => "date",
            ImportField::Program => "program",
            ImportField::VariantType => "variant_type",
            ImportField::VariantDateTime => "variant_date_time",
            ImportField::VariantValue => "variant_value",
            ImportField::VariantComment => "variant_comment",
            ImportField::Parameter => "parameter",
            ImportField::Value => "value",
            ImportField::Quality => "quality",
            ImportField::Laboratory => "laboratory",
            ImportField::SamplingMethod => "sampling_method",
        }
    }
}

impl FromStr for ImportField {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImportField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| SchemaError::UnknownField(s.to_string()))
    }
}

impl fmt::Display for ImportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One flattened row destined for the import service.
///
/// Records are built once by an enumerator and never mutated afterwards;
/// they are addressed only by their position in the in-flight list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportRecord {
    fields: BTreeMap<ImportField, Value>,
}

impl ImportRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, field: ImportField, value: impl Into<Value>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    pub fn get(&self, field: ImportField) -> Option<&Value> {
        self.fields.get(&field)
    }

    /// Look up a field by its wire name.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        name.parse::<ImportField>().ok().and_then(|f| self.get(f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImportField, &Value)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when both records agree on every identity field (absent equals absent).
    pub fn same_identity(&self, other: &ImportRecord) -> bool {
        ImportField::IDENTITY
            .iter()
            .all(|f| self.get(*f) == other.get(*f))
    }

    /// True when both `value` and `variant_value` are exactly zero.
    pub fn is_zero_observation(&self) -> bool {
        let zero = |f| self.get(f).map(Value::is_zero).unwrap_or(false);
        zero(ImportField::Value) && zero(ImportField::VariantValue)
    }
}

impl FromIterator<(ImportField, Value)> for ImportRecord {
    fn from_iter<I: IntoIterator<Item = (ImportField, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl Serialize for ImportRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field.as_str(), value)?;
        }
        map.end()
    }
}
