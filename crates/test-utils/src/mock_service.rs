//! In-memory [`ImportService`] that records every call.
//!
//! `check` replies are scripted as a queue; once the queue is empty every
//! further check returns no messages. Created entities get ids counting up
//! from 1000.

use async_trait::async_trait;
use import_client::{ImportService, ServiceError, ServiceResult};
use import_common::{
    CheckMessage, CheckResults, EntityKind, ImportRecord, ImportRunResult, ReferenceEntity,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// One recorded service call.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    Check { records: usize },
    ListEntities(EntityKind),
    CreateEntity(EntityKind, ReferenceEntity),
    CreateLookup { kind: EntityKind, key: String, id: i64 },
    Submit { records: usize },
}

#[derive(Default)]
struct MockState {
    check_results: VecDeque<CheckResults>,
    remote: BTreeMap<EntityKind, Vec<ReferenceEntity>>,
    next_id: i64,
    fail_submit: Option<u16>,
    calls: Vec<ServiceCall>,
    submitted: Vec<Vec<ImportRecord>>,
}

pub struct MockImportService {
    state: Mutex<MockState>,
}

impl Default for MockImportService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockImportService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_id: 1000,
                ..MockState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }

    /// Queue the reply for the next `check` call.
    pub fn push_check(&self, messages: Vec<CheckMessage>, has_error_message: bool) -> &Self {
        self.state().check_results.push_back(CheckResults {
            messages,
            has_error_message,
        });
        self
    }

    /// Seed an entity the service already knows.
    pub fn with_remote_entity(self, kind: EntityKind, entity: ReferenceEntity) -> Self {
        self.state().remote.entry(kind).or_default().push(entity);
        self
    }

    /// Make `submit` fail with the given HTTP status.
    pub fn failing_submit(self, status: u16) -> Self {
        self.state().fail_submit = Some(status);
        self
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.state().calls.clone()
    }

    /// Record lists passed to `submit`, one per call.
    pub fn submitted(&self) -> Vec<Vec<ImportRecord>> {
        self.state().submitted.clone()
    }

    pub fn created(&self) -> Vec<(EntityKind, ReferenceEntity)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ServiceCall::CreateEntity(kind, entity) => Some((kind, entity)),
                _ => None,
            })
            .collect()
    }

    pub fn lookups(&self) -> Vec<(EntityKind, String, i64)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ServiceCall::CreateLookup { kind, key, id } => Some((kind, key, id)),
                _ => None,
            })
            .collect()
    }

    pub fn check_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ServiceCall::Check { .. }))
            .count()
    }
}

#[async_trait]
impl ImportService for MockImportService {
    async fn check(&self, records: &[ImportRecord]) -> ServiceResult<CheckResults> {
        let mut state = self.state();
        state.calls.push(ServiceCall::Check {
            records: records.len(),
        });
        Ok(state.check_results.pop_front().unwrap_or_default())
    }

    async fn list_entities(&self, kind: EntityKind) -> ServiceResult<Vec<ReferenceEntity>> {
        let mut state = self.state();
        state.calls.push(ServiceCall::ListEntities(kind));
        Ok(state.remote.get(&kind).cloned().unwrap_or_default())
    }

    async fn create_entity(
        &self,
        kind: EntityKind,
        entity: &ReferenceEntity,
    ) -> ServiceResult<ReferenceEntity> {
        let mut state = self.state();
        state.calls.push(ServiceCall::CreateEntity(kind, entity.clone()));

        let mut created = entity.clone();
        created.id = Some(state.next_id);
        state.next_id += 1;
        state.remote.entry(kind).or_default().push(created.clone());
        Ok(created)
    }

    async fn create_lookup(&self, kind: EntityKind, key: &str, id: i64) -> ServiceResult<()> {
        self.state().calls.push(ServiceCall::CreateLookup {
            kind,
            key: key.to_string(),
            id,
        });
        Ok(())
    }

    async fn submit(&self, records: &[ImportRecord]) -> ServiceResult<ImportRunResult> {
        let mut state = self.state();
        state.calls.push(ServiceCall::Submit {
            records: records.len(),
        });
        if let Some(status) = state.fail_submit {
            return Err(ServiceError::Status {
                status,
                body: "import failed".to_string(),
            });
        }
        state.submitted.push(records.to_vec());
        Ok(ImportRunResult {
            imported_sample_count: records.len() as u64,
            imported_variant_count: 0,
            imported_value_count: records.len() as u64,
        })
    }
}
