//! Options controlling a batched import run.

use serde::{Deserialize, Serialize};

/// Default maximum number of records submitted per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Maximum records per batch; a single larger file still forms its own batch.
    pub batch_size: usize,
    /// Run every check but skip the final submission.
    pub dry_run: bool,
    /// Drop records whose sample already exists remotely before submitting.
    pub skip_exist_sample: bool,
    /// Keep only the last record of each identity class.
    pub remove_duplicates: bool,
    /// Drop duplicated records whose value and variant value are both zero.
    pub remove_zero_duplicates: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            dry_run: false,
            skip_exist_sample: false,
            remove_duplicates: false,
            remove_zero_duplicates: false,
        }
    }
}
