//! Observation importer.
//!
//! Extracts records from NetCDF and JSON observation files using mapping
//! files and imports them, batch by batch, through the import API.

mod config;
mod sources;

use anyhow::{Context, Result};
use clap::Parser;
use import_client::HttpImportService;
use ingestion::{BatchController, Extractor};
use mapping::MappingConfig;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::{ImporterConfig, SourceConfig};
use sources::discover_sources;

#[derive(Parser, Debug)]
#[command(name = "importer")]
#[command(about = "Import observation datasets into the import API")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source files or directories
    sources: Vec<PathBuf>,

    /// Mapping file used for sources given on the command line
    #[arg(short, long, requires = "sources")]
    mapping: Option<PathBuf>,

    /// API host
    #[arg(long)]
    host: Option<String>,

    /// Target pool id
    #[arg(long)]
    pool_id: Option<i64>,

    /// Maximum records per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Check everything but do not submit
    #[arg(long)]
    dry_run: bool,

    /// Drop records whose sample already exists
    #[arg(long)]
    skip_exist_sample: bool,

    /// Keep only the last of each duplicated record
    #[arg(long)]
    remove_duplicates: bool,

    /// Drop duplicated records with zero value and variant value
    #[arg(long)]
    remove_zero_duplicates: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format (json or pretty)
    #[arg(long, default_value = "json")]
    log_format: String,
}

impl Args {
    fn apply(&self, config: &mut ImporterConfig) -> Result<()> {
        if let Some(host) = &self.host {
            config.service.host = host.clone();
        }
        if let Some(pool_id) = self.pool_id {
            config.service.pool_id = pool_id;
        }
        if let Some(batch_size) = self.batch_size {
            config.options.batch_size = batch_size;
        }
        config.options.dry_run |= self.dry_run;
        config.options.skip_exist_sample |= self.skip_exist_sample;
        config.options.remove_duplicates |= self.remove_duplicates;
        config.options.remove_zero_duplicates |= self.remove_zero_duplicates;

        if !self.sources.is_empty() {
            let mapping = self
                .mapping
                .clone()
                .context("--mapping is required for sources given on the command line")?;
            config.sources.extend(self.sources.iter().map(|path| SourceConfig {
                path: path.clone(),
                mapping: mapping.clone(),
            }));
        }
        Ok(())
    }
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if args.log_format == "pretty" {
        tracing::subscriber::set_global_default(builder.pretty().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    }
    Ok(())
}

/// Expand every configured source into extractors, loading each mapping file
/// once. Source files are read later, batch by batch.
fn collect_sources(sources: &[SourceConfig]) -> Result<Vec<Extractor>> {
    let mut mappings: BTreeMap<PathBuf, MappingConfig> = BTreeMap::new();
    let mut extractors = Vec::new();

    for source in sources {
        if !mappings.contains_key(&source.mapping) {
            let mapping = MappingConfig::from_path(&source.mapping)
                .with_context(|| format!("Failed to load mapping {:?}", source.mapping))?;
            mappings.insert(source.mapping.clone(), mapping);
        }
        let mapping = &mappings[&source.mapping];

        for path in discover_sources(&source.path)? {
            let extractor = Extractor::from_path(&path, mapping.clone())
                .with_context(|| format!("Unsupported source {:?}", path))?;
            extractors.push(extractor);
        }
    }

    Ok(extractors)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;

    #[cfg(feature = "netcdf")]
    netcdf_parser::silence_hdf5_errors();

    let mut config = ImporterConfig::load(args.config.as_deref())?;
    config.apply_env()?;
    args.apply(&mut config)?;
    config.validate()?;

    info!(
        host = %config.service.host,
        pool_id = config.service.pool_id,
        sources = config.sources.len(),
        options = ?config.options,
        "Loaded configuration"
    );

    let extractors = collect_sources(&config.sources)?;
    info!(files = extractors.len(), "Found sources");

    let service = HttpImportService::new(&config.service)?;
    let controller = BatchController::new(&service, config.options.clone());
    let summary = controller.run(&extractors).await?;

    info!(
        batches = summary.batches,
        records = summary.records,
        duplicates_removed = summary.duplicates_removed,
        skipped = summary.skipped,
        entities_created = summary.entities_created,
        imported_samples = summary.result.imported_sample_count,
        imported_variants = summary.result.imported_variant_count,
        imported_values = summary.result.imported_value_count,
        "Import finished"
    );

    Ok(())
}
