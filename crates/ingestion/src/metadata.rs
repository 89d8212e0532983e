//! Reference entity aggregation and creation.
//!
//! Validation messages flag records that reference entities the service does
//! not know yet. [`resolve_metadata`] builds those entities from the mapping's
//! templates into a [`MetadataAggregator`], deduplicating by identity fields
//! and remembering which external keys point at which entity.
//! [`create_metadata`] then makes sure every aggregated entity exists remotely
//! and registers its lookup keys.

use import_client::ImportService;
use import_common::{CheckMessage, EntityKind, ImportRecord, ReferenceEntity};
use mapping::{Evaluator, MappingConfig, SourceAdapter};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument, warn};

use crate::error::{IngestionError, Result};

/// Deduplicated reference entities per kind, with their lookup keys.
#[derive(Debug, Clone, Default)]
pub struct MetadataAggregator {
    entities: BTreeMap<EntityKind, Vec<ReferenceEntity>>,
    lookups: BTreeMap<EntityKind, BTreeSet<(String, usize)>>,
}

impl MetadataAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity, returning its index within the kind.
    ///
    /// An identity-equal entity already present is reused and the new
    /// attributes are discarded.
    pub fn add(&mut self, kind: EntityKind, entity: ReferenceEntity, lookup_key: Option<&str>) -> usize {
        let list = self.entities.entry(kind).or_default();
        let index = match list.iter().position(|e| e.identity_matches(&entity, kind)) {
            Some(index) => index,
            None => {
                list.push(entity);
                list.len() - 1
            }
        };

        if let Some(key) = lookup_key {
            self.lookups
                .entry(kind)
                .or_default()
                .insert((key.to_string(), index));
        }
        index
    }

    pub fn entities(&self, kind: EntityKind) -> &[ReferenceEntity] {
        self.entities.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entities_mut(&mut self, kind: EntityKind) -> &mut [ReferenceEntity] {
        self.entities
            .get_mut(&kind)
            .map(Vec::as_mut_slice)
            .unwrap_or_default()
    }

    /// `(key, entity index)` pairs of a kind in sorted order.
    pub fn lookups(&self, kind: EntityKind) -> Vec<(String, usize)> {
        self.lookups
            .get(&kind)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.values().all(Vec::is_empty)
    }

    /// Total entities across all kinds.
    pub fn len(&self) -> usize {
        self.entities.values().map(Vec::len).sum()
    }
}

/// Turn new-entity messages into aggregated entities.
///
/// Messages must already be indexed relative to `records`. Out-of-range
/// indices and messages without a recognised marker set are skipped.
/// Returns the number of messages that produced an entity.
pub fn resolve_metadata<S: SourceAdapter>(
    source: &S,
    mapping: &MappingConfig,
    records: &[ImportRecord],
    messages: &[CheckMessage],
    aggregator: &mut MetadataAggregator,
) -> Result<usize> {
    let mut resolved = 0;

    for message in messages.iter().filter(|m| m.is_new_entity()) {
        let Some(record) = records.get(message.index) else {
            debug!(index = message.index, "Message index outside source records");
            continue;
        };
        let Some(kind) = EntityKind::from_markers(&message.fields) else {
            debug!(fields = ?message.fields, "No entity kind for message");
            continue;
        };

        let template = mapping.entity_template(kind)?;
        let entity = Evaluator::for_record(source, record)
            .build_entity(template)
            .map_err(|e| IngestionError::expression(message.index, e))?;

        let key = kind
            .lookup_field()
            .and_then(|field| record.get(field))
            .map(|value| value.to_string());
        aggregator.add(kind, entity, key.as_deref());
        resolved += 1;
    }

    Ok(resolved)
}

/// Counts from one creation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataSummary {
    pub reused: usize,
    pub created: usize,
    pub lookups: usize,
}

/// Ensure every aggregated entity exists remotely, write the ids back and
/// register lookup keys.
///
/// Kinds are processed in [`EntityKind::ALL`] order. Remote entities are
/// listed once per kind.
#[instrument(skip(service, aggregator), fields(entities = aggregator.len()))]
pub async fn create_metadata<S: ImportService + ?Sized>(
    service: &S,
    aggregator: &mut MetadataAggregator,
) -> Result<MetadataSummary> {
    let mut summary = MetadataSummary::default();

    for kind in EntityKind::ALL {
        if aggregator.entities(kind).is_empty() {
            continue;
        }

        let remote = service.list_entities(kind).await?;
        let mut created = 0;
        let mut reused = 0;

        for entity in aggregator.entities_mut(kind) {
            if let Some(existing) = remote.iter().find(|r| r.identity_matches(entity, kind)) {
                entity.id = existing.id;
                reused += 1;
            } else {
                let response = service.create_entity(kind, entity).await?;
                entity.id = response.id;
                created += 1;
            }
        }

        let mut lookups = 0;
        for (key, index) in aggregator.lookups(kind) {
            let Some(id) = aggregator.entities(kind).get(index).and_then(|e| e.id) else {
                warn!(kind = %kind, key = %key, "Entity has no id, skipping lookup");
                continue;
            };
            service.create_lookup(kind, &key, id).await?;
            lookups += 1;
        }

        info!(
            kind = %kind,
            reused = reused,
            created = created,
            lookups = lookups,
            "Metadata ready"
        );
        summary.reused += reused;
        summary.created += created;
        summary.lookups += lookups;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use import_common::{CheckStage, CheckStatus, ImportField, Value};

    #[test]
    fn test_add_reuses_identity_match() {
        let mut agg = MetadataAggregator::new();
        let first = agg.add(
            EntityKind::Site,
            ReferenceEntity::new()
                .with("name", "Site A")
                .with("location", "Bay")
                .with("description", "first"),
            Some("S1"),
        );
        let second = agg.add(
            EntityKind::Site,
            ReferenceEntity::new()
                .with("name", "Site A")
                .with("location", "Bay")
                .with("description", "second"),
            Some("S1"),
        );
        assert_eq!(first, second);
        assert_eq!(agg.entities(EntityKind::Site).len(), 1);
        assert_eq!(
            agg.entities(EntityKind::Site)[0].get("description"),
            Some(&Value::from("first"))
        );
        assert_eq!(agg.lookups(EntityKind::Site), vec![("S1".to_string(), 0)]);
    }

    #[test]
    fn test_add_distinguishes_identity_fields() {
        let mut agg = MetadataAggregator::new();
        let a = agg.add(
            EntityKind::Parameter,
            ReferenceEntity::new().with("name", "Temp").with("unit", "degC"),
            Some("TEMP"),
        );
        let b = agg.add(
            EntityKind::Parameter,
            ReferenceEntity::new().with("name", "Temp").with("unit", "K"),
            Some("TEMP_K"),
        );
        assert_ne!(a, b);
        assert_eq!(agg.len(), 2);
        assert!(agg.entities(EntityKind::Quality).is_empty());
        assert!(agg.entities_mut(EntityKind::Quality).is_empty());
    }

    #[test]
    fn test_lookups_sorted() {
        let mut agg = MetadataAggregator::new();
        agg.add(EntityKind::Program, ReferenceEntity::new().with("name", "B"), Some("pb"));
        agg.add(EntityKind::Program, ReferenceEntity::new().with("name", "A"), Some("pa"));
        agg.add(EntityKind::Program, ReferenceEntity::new().with("name", "A"), None);
        assert_eq!(
            agg.lookups(EntityKind::Program),
            vec![("pa".to_string(), 1), ("pb".to_string(), 0)]
        );
    }

    struct RecordOnly;

    impl SourceAdapter for RecordOnly {
        type Cursor = ();

        fn float_digits(&self) -> usize {
            8
        }

        fn read(
            &self,
            _accessor: &str,
            _args: &[&str],
            _cursor: Option<&()>,
        ) -> std::result::Result<Value, mapping::AccessError> {
            Err(mapping::AccessError::UnknownAccessor)
        }
    }

    #[test]
    fn test_resolve_filters_and_keys() {
        let mapping = MappingConfig::from_json_str(
            r#"{"templates": {"site": {"name": "FIELD site_code", "location": "CONST bay"}}}"#,
        )
        .unwrap();
        let records = vec![ImportRecord::new().with(ImportField::SiteCode, "S1")];
        let messages = vec![
            CheckMessage::new(0, CheckStage::METADATA, CheckStatus::WARNING, &["SiteName", "SiteCode"]),
            CheckMessage::new(0, CheckStage::METADATA, CheckStatus::ERROR, &["SiteName", "SiteCode"]),
            CheckMessage::new(0, CheckStage::METADATA, CheckStatus::WARNING, &["Unrelated"]),
            CheckMessage::new(5, CheckStage::METADATA, CheckStatus::WARNING, &["SiteName", "SiteCode"]),
        ];
        let mut agg = MetadataAggregator::new();
        let resolved = resolve_metadata(&RecordOnly, &mapping, &records, &messages, &mut agg).unwrap();
        assert_eq!(resolved, 1);
        assert_eq!(
            agg.entities(EntityKind::Site)[0].get("name"),
            Some(&Value::from("S1"))
        );
        assert_eq!(agg.lookups(EntityKind::Site), vec![("S1".to_string(), 0)]);
    }

    #[test]
    fn test_resolve_missing_template_is_error() {
        let mapping = MappingConfig::default();
        let records = vec![ImportRecord::new()];
        let messages = vec![CheckMessage::new(
            0,
            CheckStage::METADATA,
            CheckStatus::WARNING,
            &["Quality"],
        )];
        let mut agg = MetadataAggregator::new();
        assert!(matches!(
            resolve_metadata(&RecordOnly, &mapping, &records, &messages, &mut agg),
            Err(IngestionError::Mapping(_))
        ));
    }
}
