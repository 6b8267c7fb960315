//! Manifest writer: one `images.json` per directory.

use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use crate::DirectoryManifest;
use crate::utils::config::OutputNames;
use crate::utils::write_atomic;

/// Path of the manifest for `dir`.
pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(OutputNames::MANIFEST_FILENAME)
}

/// Serialize `manifest` (sorted keys, two-space indent, empty optional fields omitted).
pub fn render_manifest(manifest: &DirectoryManifest) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(manifest).context("serialize manifest")
}

/// Write `manifest` to `<dir>/images.json` through a temp file and rename. Returns the path written.
pub fn write_manifest(dir: &Path, manifest: &DirectoryManifest) -> Result<PathBuf> {
    let path = manifest_path(dir);
    info!("Saving JSON to {}", path.display());
    let bytes = render_manifest(manifest)?;
    write_atomic(&path, &bytes).with_context(|| format!("write manifest {}", path.display()))?;
    Ok(path)
}

/// Read a manifest back (used by callers that post-process the output, and by tests).
pub fn read_manifest(dir: &Path) -> Result<DirectoryManifest> {
    let path = manifest_path(dir);
    let s = std::fs::read_to_string(&path)
        .with_context(|| format!("read manifest {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse manifest {}", path.display()))
}
