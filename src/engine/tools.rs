//! Path and tuning utilities

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// Canonicalize the root and require it to be a directory.
pub fn check_root_and_canonicalize(path: &Path) -> Result<PathBuf> {
    let path = path
        .canonicalize()
        .with_context(|| format!("canonicalize {}", path.display()))?;
    if !path.is_dir() {
        bail!("Not a directory: {}", path.display());
    }
    Ok(path)
}

/// Worker count: the override if given, otherwise the available parallelism. Never zero.
pub fn worker_count(thread_override: Option<usize>) -> usize {
    thread_override
        .unwrap_or_else(rayon::current_num_threads)
        .max(1)
}
