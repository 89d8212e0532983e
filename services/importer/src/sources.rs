//! Source file discovery.

use anyhow::{Context, Result};
use ingestion::detect_source_kind;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Expand a path into source files.
///
/// A file is returned as given. A directory is walked recursively and only
/// files with a supported extension are kept, in sorted order.
pub fn discover_sources(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        anyhow::ensure!(path.exists(), "Source {:?} does not exist", path);
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry.with_context(|| format!("Failed to walk {:?}", path))?;
        if entry.file_type().is_file() && detect_source_kind(entry.path()).is_some() {
            files.push(entry.into_path());
        } else {
            debug!(path = %entry.path().display(), "Skipping");
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{temp_test_dir, write_test_file};

    #[test]
    fn test_directory_walk_filters_and_sorts() {
        let dir = temp_test_dir();
        write_test_file(dir.path(), "b/IDV60901.95936.json", "{}");
        write_test_file(dir.path(), "a/mooring.nc", "");
        write_test_file(dir.path(), "a/notes.txt", "");
        write_test_file(dir.path(), "c.json", "{}");

        let files = discover_sources(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a/mooring.nc", "b/IDV60901.95936.json", "c.json"]);
    }

    #[test]
    fn test_explicit_file_kept() {
        let dir = temp_test_dir();
        let path = write_test_file(dir.path(), "obs.csv", "");
        assert_eq!(discover_sources(&path).unwrap(), vec![path]);
    }

    #[test]
    fn test_missing_path_is_error() {
        let dir = temp_test_dir();
        assert!(discover_sources(&dir.path().join("missing.json")).is_err());
    }
}
