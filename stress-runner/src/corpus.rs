//! Reading and writing input files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Loads every input named by `paths`.
///
/// Directories contribute their regular files in name order; nested
/// directories are not descended into.
pub fn load(paths: &[PathBuf]) -> Result<Vec<(PathBuf, Vec<u8>)>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries = fs::read_dir(path)
                .with_context(|| format!("Failed to read directory {}", path.display()))?
                .map(|entry| entry.map(|entry| entry.path()))
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Failed to list directory {}", path.display()))?;
            entries.retain(|entry| entry.is_file());
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }

    files
        .into_iter()
        .map(|file| {
            let bytes = fs::read(&file)
                .with_context(|| format!("Failed to read input {}", file.display()))?;
            Ok((file, bytes))
        })
        .collect()
}

/// Writes a failing input to `directory` and returns its path.
pub fn save_failure(directory: &Path, seed: u64, run: u64, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create {}", directory.display()))?;
    let path = directory.join(format!("seed-{seed}-run-{run}.bin"));
    fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
