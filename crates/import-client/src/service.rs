//! The import service contract.

use async_trait::async_trait;
use import_common::{CheckResults, EntityKind, ImportRecord, ImportRunResult, ReferenceEntity};

use crate::error::ServiceResult;

/// Remote validation and import operations.
///
/// Calls are awaited one at a time by the pipeline; implementations do not retry.
#[async_trait]
pub trait ImportService: Send + Sync {
    /// Validate records without importing them.
    async fn check(&self, records: &[ImportRecord]) -> ServiceResult<CheckResults>;

    /// All existing entities of a kind.
    async fn list_entities(&self, kind: EntityKind) -> ServiceResult<Vec<ReferenceEntity>>;

    /// Create an entity; the returned copy carries the assigned id.
    async fn create_entity(
        &self,
        kind: EntityKind,
        entity: &ReferenceEntity,
    ) -> ServiceResult<ReferenceEntity>;

    /// Associate an external key with an entity id.
    async fn create_lookup(&self, kind: EntityKind, key: &str, id: i64) -> ServiceResult<()>;

    /// Import records.
    async fn submit(&self, records: &[ImportRecord]) -> ServiceResult<ImportRunResult>;
}
