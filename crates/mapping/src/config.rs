//! Mapping configuration files.
//!
//! ```json
//! {
//!   "import_path": "observations.data",
//!   "templates": {
//!     "import": { "site_code": "JSON $.wmo", "value": "JSON $.air_temp !float" },
//!     "site": { "name": "FIELD site_code", "location": "CONST unknown" }
//!   }
//! }
//! ```

use import_common::{EntityKind, ImportField};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{MappingError, MappingResult};

/// Name of the template that builds import records.
pub const IMPORT_TEMPLATE: &str = "import";

/// Ordered `(output name, expression)` pairs, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template(Vec<(String, String)>);

impl Template {
    pub fn entries(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Template {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Template(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<'de> Deserialize<'de> for Template {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TemplateVisitor;

        impl<'de> Visitor<'de> for TemplateVisitor {
            type Value = Template;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field names to expressions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Template, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    entries.push((key, value));
                }
                Ok(Template(entries))
            }
        }

        deserializer.deserialize_map(TemplateVisitor)
    }
}

/// A parsed mapping file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingConfig {
    /// Dot-separated path to the row list (document sources).
    #[serde(default)]
    pub import_path: Option<String>,

    /// Variables enumerated one after another (array sources).
    #[serde(default)]
    pub parameters: Vec<String>,

    #[serde(default)]
    pub templates: BTreeMap<String, Template>,
}

impl MappingConfig {
    /// Load and validate a mapping from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> MappingResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a mapping from JSON text.
    pub fn from_json_str(text: &str) -> MappingResult<Self> {
        let config: MappingConfig = serde_json::from_str(text)?;
        if let Some(import) = config.templates.get(IMPORT_TEMPLATE) {
            for (name, _) in import.entries() {
                name.parse::<ImportField>()
                    .map_err(|_| MappingError::UnknownField(name.clone()))?;
            }
        }
        Ok(config)
    }

    pub fn template(&self, name: &str) -> MappingResult<&Template> {
        self.templates
            .get(name)
            .ok_or_else(|| MappingError::MissingTemplate(name.to_string()))
    }

    /// Template for a reference-entity kind.
    pub fn entity_template(&self, kind: EntityKind) -> MappingResult<&Template> {
        self.template(kind.template_name())
    }

    /// The `import` template with its keys resolved to record fields.
    pub fn import_template(&self) -> MappingResult<Vec<(ImportField, &str)>> {
        self.template(IMPORT_TEMPLATE)?
            .entries()
            .iter()
            .map(|(name, expr)| {
                name.parse::<ImportField>()
                    .map(|field| (field, expr.as_str()))
                    .map_err(|_| MappingError::UnknownField(name.clone()))
            })
            .collect()
    }
}
