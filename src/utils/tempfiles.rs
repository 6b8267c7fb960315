use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::utils::config::PackagePaths;

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Sibling temp path for `path`: same directory, package temp marker plus a per-call sequence
/// appended. Two writers targeting the same file never share a temp file.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    path.parent().unwrap_or(Path::new(".")).join(format!(
        "{name}{}.{}.{seq}",
        PackagePaths::get().temp_marker(),
        std::process::id()
    ))
}

/// Write `bytes` to a temp sibling and rename it over `path`, so readers never see a partial file.
/// The temp file is removed if the rename fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = temp_path_for(path);
    fs::write(&temp_path, bytes)
        .with_context(|| format!("write temp file {}", temp_path.display()))?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e).with_context(|| {
            format!(
                "atomic rename ({} -> {})",
                temp_path.display(),
                path.display()
            )
        });
    }
    Ok(())
}
