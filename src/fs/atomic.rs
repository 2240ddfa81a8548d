//! Atomic file writes for gate artifacts.
//!
//! Evidence and failure reports may be tailed by dashboards while a gate is
//! running, so every artifact is staged in a temp file beside its target and
//! renamed into place. Readers observe either the previous file or the
//! complete new one.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `contents` to `path` via temp-file-then-rename.
///
/// Parent directories are created as needed. Errors are returned, never
/// swallowed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    if !parent.exists() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut staging = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    staging
        .write_all(contents)
        .with_context(|| format!("Failed to write staged contents for {}", path.display()))?;
    staging
        .as_file()
        .sync_all()
        .with_context(|| format!("Failed to sync staged file for {}", path.display()))?;

    staging
        .persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to move staged file into place: {}", path.display()))?;

    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically.
pub fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    write_atomic(path, json.as_bytes())
}
