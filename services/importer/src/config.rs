//! Importer configuration.
//!
//! Values come from three layers, later ones winning:
//! 1. an optional YAML file (with `${VAR}` / `${VAR:-default}` substitution)
//! 2. `IMPORT_*` environment variables
//! 3. command-line flags

use anyhow::{Context, Result};
use import_client::ServiceConfig;
use ingestion::ImportOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One configured source: a file or directory and the mapping used for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,
    pub mapping: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    pub service: ServiceConfig,
    pub options: ImportOptions,
    pub sources: Vec<SourceConfig>,
}

impl ImporterConfig {
    /// Load from a YAML file, or start from defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read importer config from {:?}", path))?;
        let expanded = expand_env_vars(&content)?;
        let mut config: ImporterConfig = serde_yaml::from_str(&expanded)
            .with_context(|| format!("Failed to parse importer config from {:?}", path))?;

        // Relative source paths are relative to the config file.
        if let Some(base) = path.parent() {
            for source in &mut config.sources {
                source.path = base.join(&source.path);
                source.mapping = base.join(&source.mapping);
            }
        }
        Ok(config)
    }

    /// Override values from `IMPORT_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = var("IMPORT_API_HOST") {
            self.service.host = host;
        }
        if let Some(key) = var("IMPORT_API_KEY") {
            self.service.api_key = key;
        }
        if let Some(pool) = var("IMPORT_POOL_ID") {
            self.service.pool_id = pool
                .parse()
                .with_context(|| format!("Invalid IMPORT_POOL_ID: {}", pool))?;
        }
        if let Some(size) = var("IMPORT_BATCH_SIZE") {
            self.options.batch_size = size
                .parse()
                .with_context(|| format!("Invalid IMPORT_BATCH_SIZE: {}", size))?;
        }
        if let Some(secs) = var("IMPORT_TIMEOUT_SECS") {
            self.service.timeout_secs = secs
                .parse()
                .with_context(|| format!("Invalid IMPORT_TIMEOUT_SECS: {}", secs))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.service.host.is_empty(), "API host cannot be empty");
        anyhow::ensure!(
            !self.service.api_key.is_empty(),
            "API key is required (IMPORT_API_KEY or service.api_key)"
        );
        anyhow::ensure!(self.service.pool_id > 0, "Pool id must be positive");
        anyhow::ensure!(self.options.batch_size > 0, "Batch size must be positive");
        anyhow::ensure!(!self.sources.is_empty(), "No sources to import");
        Ok(())
    }
}

/// Expand `${VAR}` and `${VAR:-default}` in YAML content.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}
