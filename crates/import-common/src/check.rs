//! Validation feedback returned by the import service.

use serde::{Deserialize, Serialize};

/// Ordinal pipeline phase a message was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckStage(pub u8);

impl CheckStage {
    pub const PARSE: CheckStage = CheckStage(0);
    /// A referenced entity does not exist yet.
    pub const METADATA: CheckStage = CheckStage(1);
    pub const INTERNAL_DUPLICATE: CheckStage = CheckStage(2);
    pub const REMOTE_DUPLICATE: CheckStage = CheckStage(3);
}

/// Severity of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckStatus(pub u8);

impl CheckStatus {
    pub const INFO: CheckStatus = CheckStatus(0);
    pub const WARNING: CheckStatus = CheckStatus(1);
    pub const ERROR: CheckStatus = CheckStatus(2);
}

/// One message, addressed by the index of the record it concerns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckMessage {
    pub index: usize,
    pub stage: CheckStage,
    pub status: CheckStatus,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckMessage {
    pub fn new(index: usize, stage: CheckStage, status: CheckStatus, fields: &[&str]) -> Self {
        Self {
            index,
            stage,
            status,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            message: None,
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    /// A new-entity message: a referenced entity was not found remotely.
    pub fn is_new_entity(&self) -> bool {
        self.stage == CheckStage::METADATA && self.status == CheckStatus::WARNING
    }

    /// The sample already exists remotely.
    pub fn is_existing_sample(&self) -> bool {
        self.has_field("SiteCode")
            && self.stage == CheckStage::REMOTE_DUPLICATE
            && self.status == CheckStatus::INFO
    }
}

/// Result of a `check` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckResults {
    #[serde(default)]
    pub messages: Vec<CheckMessage>,
    #[serde(default)]
    pub has_error_message: bool,
}

impl CheckResults {
    /// Messages whose index falls in `[start, start + count)`, re-indexed from zero.
    pub fn window(&self, start: usize, count: usize) -> Vec<CheckMessage> {
        self.messages
            .iter()
            .filter(|m| m.index >= start && m.index < start + count)
            .map(|m| CheckMessage {
                index: m.index - start,
                ..m.clone()
            })
            .collect()
    }
}

/// Counts reported by a `run` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRunResult {
    #[serde(default)]
    pub imported_sample_count: u64,
    #[serde(default)]
    pub imported_variant_count: u64,
    #[serde(default)]
    pub imported_value_count: u64,
}

impl ImportRunResult {
    pub fn accumulate(&mut self, other: &ImportRunResult) {
        self.imported_sample_count += other.imported_sample_count;
        self.imported_variant_count += other.imported_variant_count;
        self.imported_value_count += other.imported_value_count;
    }
}
