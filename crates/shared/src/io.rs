use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{Article, RawLog};

/// Serialize to a sibling temp file, then rename over `path`.
///
/// A failed write leaves whatever was at `path` untouched.
fn write_json_atomic<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize articles")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid output path: {}", path.display()))?;
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

    fs::write(&tmp_path, json)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e)
            .with_context(|| format!("Failed to move output into place: {}", path.display()));
    }

    Ok(())
}

/// Save the final selection as a JSON array.
pub fn save_selection(articles: &[Article], path: &Path) -> Result<PathBuf> {
    write_json_atomic(articles, path)?;
    Ok(path.to_path_buf())
}

/// Load a selection previously written by `save_selection`
pub fn load_selection(path: &Path) -> Result<Vec<Article>> {
    if !path.exists() {
        anyhow::bail!("Selection file not found: {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read selection file: {}", path.display()))?;

    serde_json::from_str(&content).with_context(|| {
        format!(
            "Failed to parse selection JSON from {}. The file may be corrupted or not a selection file.",
            path.display()
        )
    })
}

pub fn save_raw_log(log: &RawLog, path: &Path) -> Result<PathBuf> {
    write_json_atomic(log, path)?;
    Ok(path.to_path_buf())
}
