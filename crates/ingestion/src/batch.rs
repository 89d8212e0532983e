//! Batched import of extracted sources.
//!
//! Sources are never split across batches, so each batch is a run of whole
//! files. Batches are built as sources are loaded: once a batch is sealed it
//! is checked, its metadata created and its records submitted before the
//! next source is read. The service sees one concatenated record list per
//! batch; its messages are mapped back onto each file by index window before
//! metadata is resolved with that file's adapter.

use import_client::ImportService;
use import_common::{CheckStatus, ImportRecord, ImportRunResult};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

use crate::config::ImportOptions;
use crate::dedup::{remove_duplicates, remove_zero_duplicates};
use crate::error::{IngestionError, Result};
use crate::extractor::{Extractor, LoadedSource};
use crate::metadata::{create_metadata, MetadataAggregator};

/// Accumulates whole files into batches of at most `batch_size` records.
///
/// A file that would overflow a non-empty batch seals it and starts the next
/// one. A batch is also sealed as soon as it holds `batch_size` records, so a
/// file larger than `batch_size` forms a batch on its own.
#[derive(Debug)]
struct BatchBuilder<T> {
    batch_size: usize,
    items: Vec<T>,
    count: usize,
}

impl<T> BatchBuilder<T> {
    fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            items: Vec::new(),
            count: 0,
        }
    }

    /// Add a file of `count` records, returning the batch it sealed, if any.
    fn push(&mut self, item: T, count: usize) -> Option<Vec<T>> {
        let sealed = (!self.items.is_empty() && self.count + count > self.batch_size)
            .then(|| self.take());
        self.items.push(item);
        self.count += count;
        sealed
    }

    fn take_full(&mut self) -> Option<Vec<T>> {
        (!self.items.is_empty() && self.count >= self.batch_size).then(|| self.take())
    }

    fn finish(&mut self) -> Option<Vec<T>> {
        (!self.items.is_empty()).then(|| self.take())
    }

    fn take(&mut self) -> Vec<T> {
        self.count = 0;
        std::mem::take(&mut self.items)
    }
}

/// Group files into batches of at most `batch_size` records.
///
/// This is the grouping [`BatchController::run`] applies one file at a time.
pub fn plan_batches(counts: &[usize], batch_size: usize) -> Vec<Vec<usize>> {
    let mut builder = BatchBuilder::new(batch_size);
    let mut batches = Vec::new();

    for (index, &count) in counts.iter().enumerate() {
        batches.extend(builder.push(index, count));
        batches.extend(builder.take_full());
    }
    batches.extend(builder.finish());
    batches
}

/// Totals over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub batches: usize,
    /// Records sent to the first check of each batch.
    pub records: usize,
    pub duplicates_removed: usize,
    /// Records dropped because their sample already exists.
    pub skipped: usize,
    pub entities_created: usize,
    pub result: ImportRunResult,
}

impl ImportSummary {
    fn add_batch(&mut self, batch: &ImportSummary) {
        self.batches += 1;
        self.records += batch.records;
        self.skipped += batch.skipped;
        self.entities_created += batch.entities_created;
        self.result.accumulate(&batch.result);
    }
}

/// A loaded source waiting in the open batch.
struct PendingSource<'s> {
    source: LoadedSource<'s>,
    records: Vec<ImportRecord>,
}

/// Drives extraction, metadata creation and submission against an [`ImportService`].
pub struct BatchController<'a, S: ImportService + ?Sized> {
    service: &'a S,
    options: ImportOptions,
}

impl<'a, S: ImportService + ?Sized> BatchController<'a, S> {
    pub fn new(service: &'a S, options: ImportOptions) -> Self {
        Self { service, options }
    }

    /// Import every source in order. A failing batch or source aborts the
    /// run; batches already submitted stay submitted.
    #[instrument(skip(self, sources), fields(sources = sources.len()))]
    pub async fn run(&self, sources: &[Extractor]) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        let mut builder = BatchBuilder::new(self.options.batch_size);
        info!(batch_size = self.options.batch_size, "Starting import");

        for source in sources {
            let loaded = source.load()?;
            let mut records = loaded.extract()?;
            summary.duplicates_removed += self.suppress_duplicates(&mut records);
            if records.is_empty() {
                debug!(source = %source.name(), "No records, skipping source");
                continue;
            }

            let count = records.len();
            let pending = PendingSource {
                source: loaded,
                records,
            };
            if let Some(batch) = builder.push(pending, count) {
                self.import_batch(batch, &mut summary).await?;
            }
            if let Some(batch) = builder.take_full() {
                self.import_batch(batch, &mut summary).await?;
            }
        }
        if let Some(batch) = builder.finish() {
            self.import_batch(batch, &mut summary).await?;
        }

        info!(
            batches = summary.batches,
            records = summary.records,
            imported_samples = summary.result.imported_sample_count,
            imported_values = summary.result.imported_value_count,
            dry_run = self.options.dry_run,
            "Import complete"
        );
        Ok(summary)
    }

    /// Run one sealed batch, then release its sources.
    async fn import_batch(
        &self,
        batch: Vec<PendingSource<'_>>,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        let names: Vec<&str> = batch.iter().map(|p| p.source.name()).collect();
        info!(batch = summary.batches + 1, files = ?names, "Starting batch");

        let result = self.run_batch(&batch).await?;
        summary.add_batch(&result);
        Ok(())
    }

    fn suppress_duplicates(&self, records: &mut Vec<ImportRecord>) -> usize {
        let mut removed = 0;
        if self.options.remove_zero_duplicates {
            removed += remove_zero_duplicates(records);
        }
        if self.options.remove_duplicates {
            removed += remove_duplicates(records);
        }
        removed
    }

    async fn run_batch(&self, batch: &[PendingSource<'_>]) -> Result<ImportSummary> {
        let records: Vec<ImportRecord> = batch
            .iter()
            .flat_map(|p| p.records.iter().cloned())
            .collect();
        let results = self.service.check(&records).await?;

        let mut aggregator = MetadataAggregator::new();
        let mut start = 0;
        for pending in batch {
            let count = pending.records.len();
            let messages = results.window(start, count);
            let resolved = pending
                .source
                .resolve_metadata(&pending.records, &messages, &mut aggregator)?;
            debug!(
                source = %pending.source.name(),
                start = start,
                messages = messages.len(),
                resolved = resolved,
                "Resolved metadata"
            );
            start += count;
        }

        let metadata = create_metadata(self.service, &mut aggregator).await?;

        let total = records.len();
        let (result, skipped) = self.run_import(records).await?;
        Ok(ImportSummary {
            batches: 1,
            records: total,
            duplicates_removed: 0,
            skipped,
            entities_created: metadata.created,
            result,
        })
    }

    /// Final check and submission of one batch.
    async fn run_import(&self, mut records: Vec<ImportRecord>) -> Result<(ImportRunResult, usize)> {
        let mut results = self.service.check(&records).await?;
        let mut skipped = 0;

        if self.options.skip_exist_sample {
            let existing: BTreeSet<usize> = results
                .messages
                .iter()
                .filter(|m| m.is_existing_sample())
                .map(|m| m.index)
                .collect();

            let before = records.len();
            let mut index = 0;
            records.retain(|_| {
                let keep = !existing.contains(&index);
                index += 1;
                keep
            });
            skipped = before - records.len();
            info!(skipped = skipped, remaining = records.len(), "Skipped existing samples");

            results = self.service.check(&records).await?;
        }

        if results.has_error_message {
            let messages: Vec<_> = results
                .messages
                .into_iter()
                .filter(|m| m.status == CheckStatus::ERROR)
                .collect();
            warn!(errors = messages.len(), "Import check reported errors");
            return Err(IngestionError::ValidationService { messages });
        }

        if self.options.dry_run {
            info!(records = records.len(), "Dry run, not submitting");
            return Ok((ImportRunResult::default(), skipped));
        }

        if records.is_empty() {
            debug!("Nothing left to submit");
            return Ok((ImportRunResult::default(), skipped));
        }

        let result = self.service.submit(&records).await?;
        info!(
            samples = result.imported_sample_count,
            variants = result.imported_variant_count,
            values = result.imported_value_count,
            "Batch imported"
        );
        Ok((result, skipped))
    }
}
