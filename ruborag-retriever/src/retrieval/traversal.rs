//! Expanding command-line inputs into the list of files to process.

use crate::error::{Result, RetrieverError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Whether `path` has one of `extensions` (compared case-insensitively, without the dot).
pub fn has_eligible_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Expands `inputs` into files, in a reproducible order.
///
/// Directories are walked recursively, skipping hidden and gitignored entries
/// and any file without an eligible extension; each directory's files are
/// sorted by path. Explicitly named files are always kept. Inputs keep their
/// argument order and a file reached twice is listed once.
pub fn collect_inputs(inputs: &[PathBuf], extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for input in inputs {
        let metadata = std::fs::metadata(input).map_err(|e| RetrieverError::Read {
            path: input.clone(),
            message: e.to_string(),
        })?;

        let found = if metadata.is_dir() {
            walk_directory(input, extensions)
        } else {
            vec![input.clone()]
        };

        for file in found {
            if seen.insert(file.clone()) {
                files.push(file);
            }
        }
    }

    debug!("Collected {} input files", files.len());
    Ok(files)
}

fn walk_directory(dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in ignore::Walk::new(dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to read entry under {}: {}", dir.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.into_path();
        if has_eligible_extension(&path, extensions) {
            files.push(path);
        } else {
            debug!("Skipping {} (ineligible extension)", path.display());
        }
    }

    files.sort();
    files
}
