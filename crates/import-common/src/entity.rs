//! Reference ("metadata") entity kinds and their identity rules.

use crate::error::SchemaError;
use crate::record::ImportField;
use crate::value::Value;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The kinds of reference entity an import record can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Site,
    Program,
    VariantType,
    Parameter,
    Laboratory,
    SamplingMethod,
    Quality,
}

/// Ordered marker rules used to decide which kind a validation message concerns.
///
/// A message may carry several markers; the first rule whose markers are all
/// present wins.
pub const MARKER_RULES: [(&[&str], EntityKind); 7] = [
    (&["SiteName", "SiteCode"], EntityKind::Site),
    (&["Program"], EntityKind::Program),
    (&["VariantType"], EntityKind::VariantType),
    (&["Parameter"], EntityKind::Parameter),
    (&["Laboratory"], EntityKind::Laboratory),
    (&["SamplingMethod"], EntityKind::SamplingMethod),
    (&["Quality"], EntityKind::Quality),
];

impl EntityKind {
    /// Creation order used by the metadata sweep.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Site,
        EntityKind::Program,
        EntityKind::VariantType,
        EntityKind::Parameter,
        EntityKind::Laboratory,
        EntityKind::SamplingMethod,
        EntityKind::Quality,
    ];

    /// Name of the mapping template that builds this kind.
    pub fn template_name(&self) -> &'static str {
        match self {
            EntityKind::Site => "site",
            EntityKind::Program => "program",
            EntityKind::VariantType => "variant_type",
            EntityKind::Parameter => "parameter",
            EntityKind::Laboratory => "laboratory",
            EntityKind::SamplingMethod => "sampling_method",
            EntityKind::Quality => "quality",
        }
    }

    /// Attributes compared when deduplicating entities of this kind.
    pub fn identity_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Site => &["name", "location"],
            EntityKind::Parameter => &["name", "unit"],
            _ => &["name"],
        }
    }

    /// Record field whose value becomes the lookup key for this kind.
    pub fn lookup_field(&self) -> Option<ImportField> {
        match self {
            EntityKind::Site => Some(ImportField::SiteCode),
            EntityKind::Program => Some(ImportField::Program),
            EntityKind::VariantType => None,
            EntityKind::Parameter => Some(ImportField::Parameter),
            EntityKind::Laboratory => Some(ImportField::Laboratory),
            EntityKind::SamplingMethod => Some(ImportField::SamplingMethod),
            EntityKind::Quality => Some(ImportField::Quality),
        }
    }

    /// Remote collection name, e.g. `sites`.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Site => "sites",
            EntityKind::Program => "programs",
            EntityKind::VariantType => "sample-variant-types",
            EntityKind::Parameter => "parameters",
            EntityKind::Laboratory => "laboratories",
            EntityKind::SamplingMethod => "sampling-methods",
            EntityKind::Quality => "qualities",
        }
    }

    /// Remote lookup collection name, e.g. `site-lookups`.
    pub fn lookup_collection(&self) -> &'static str {
        match self {
            EntityKind::Site => "site-lookups",
            EntityKind::Program => "program-lookups",
            EntityKind::VariantType => "sample-variant-type-lookups",
            EntityKind::Parameter => "parameter-lookups",
            EntityKind::Laboratory => "laboratory-lookups",
            EntityKind::SamplingMethod => "sampling-method-lookups",
            EntityKind::Quality => "quality-lookups",
        }
    }

    /// Pick the kind for a set of field markers using [`MARKER_RULES`].
    pub fn from_markers<S: AsRef<str>>(markers: &[S]) -> Option<EntityKind> {
        MARKER_RULES.iter().find_map(|(required, kind)| {
            required
                .iter()
                .all(|m| markers.iter().any(|f| f.as_ref() == *m))
                .then_some(*kind)
        })
    }
}

impl FromStr for EntityKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|k| k.template_name() == s)
            .ok_or_else(|| SchemaError::UnknownEntityKind(s.to_string()))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template_name())
    }
}

/// A descriptive object referenced by import records.
///
/// `id` stays `None` until the remote service has assigned one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceEntity {
    pub attributes: BTreeMap<String, Value>,
    pub id: Option<i64>,
}

impl ReferenceEntity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// True when both entities agree on every identity field of `kind`.
    pub fn identity_matches(&self, other: &ReferenceEntity, kind: EntityKind) -> bool {
        kind.identity_fields()
            .iter()
            .all(|f| self.get(f) == other.get(f))
    }

    /// Build from a remote JSON object. `id` is lifted out, `null` attributes dropped.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        let object = json.as_object()?;
        let mut entity = ReferenceEntity::new();
        for (key, value) in object {
            if key == "id" {
                entity.id = value.as_i64();
            } else if let Some(v) = Value::from_json(value) {
                entity.attributes.insert(key.clone(), v);
            }
        }
        Some(entity)
    }
}

impl Serialize for ReferenceEntity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.attributes.len() + usize::from(self.id.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(id) = self.id {
            map.serialize_entry("id", &id)?;
        }
        for (k, v) in &self.attributes {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_priority() {
        assert_eq!(
            EntityKind::from_markers(&["SiteCode", "SiteName", "Program"]),
            Some(EntityKind::Site)
        );
        // SiteCode alone does not satisfy the site rule.
        assert_eq!(
            EntityKind::from_markers(&["SiteCode", "Program"]),
            Some(EntityKind::Program)
        );
        assert_eq!(
            EntityKind::from_markers(&["Quality", "Laboratory"]),
            Some(EntityKind::Laboratory)
        );
        assert_eq!(EntityKind::from_markers(&["Value"]), None);
    }

    #[test]
    fn test_identity_matches_per_kind() {
        let a = ReferenceEntity::new()
            .with("name", "Temp")
            .with("unit", "C")
            .with("description", "first");
        let b = ReferenceEntity::new()
            .with("name", "Temp")
            .with("unit", "C")
            .with("description", "second");
        let c = ReferenceEntity::new().with("name", "Temp").with("unit", "K");
        assert!(a.identity_matches(&b, EntityKind::Parameter));
        assert!(!a.identity_matches(&c, EntityKind::Parameter));
        assert!(a.identity_matches(&c, EntityKind::Program));
    }

    #[test]
    fn test_from_json_lifts_id() {
        let json = serde_json::json!({"id": 12, "name": "Lab A", "notes": null});
        let entity = ReferenceEntity::from_json(&json).unwrap();
        assert_eq!(entity.id, Some(12));
        assert_eq!(entity.get("name"), Some(&Value::from("Lab A")));
        assert!(entity.get("notes").is_none());
    }

    #[test]
    fn test_variant_type_has_no_lookup() {
        assert!(EntityKind::VariantType.lookup_field().is_none());
        assert_eq!(
            EntityKind::Site.lookup_field(),
            Some(ImportField::SiteCode)
        );
        assert_eq!(
            "sampling_method".parse::<EntityKind>(),
            Ok(EntityKind::SamplingMethod)
        );
    }
}
