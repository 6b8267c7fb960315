//! Path classifier: decides what the walker does with each filesystem entry.

use std::ffi::OsStr;
use std::path::Path;

use crate::WorkItem;
use crate::engine::derive::has_jpeg_extension;
use crate::utils::config::OutputNames;

/// What to do with one entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Ignore; a directory is not descended into.
    Skip,
    /// Directory holding a tile pyramid: do not descend, no manifest.
    Prune,
    /// Directory: gets a manifest bucket, keep descending.
    AcceptDir,
    /// File: one work item.
    AcceptFile(WorkItem),
}

/// Classify one entry. `ignore` is the list of name substrings that mark generated artifacts.
///
/// Rules, first match wins: ignored substring → `Skip`; directory ending in `_files` → `Prune`;
/// other directory → `AcceptDir`; file → `AcceptFile` with the extension stripped from the name.
pub fn classify(path: &Path, is_dir: bool, ignore: &[String]) -> Verdict {
    let name = match path.file_name() {
        Some(n) => n.to_string_lossy(),
        // Root given as "/" or ".." has no file name; treat it as a plain directory.
        None if is_dir => return Verdict::AcceptDir,
        None => return Verdict::Skip,
    };
    if ignore.iter().any(|s| name.contains(s.as_str())) {
        return Verdict::Skip;
    }
    if is_dir {
        if name.ends_with(OutputNames::TILE_DIR_SUFFIX) {
            return Verdict::Prune;
        }
        return Verdict::AcceptDir;
    }
    let dir = match path.parent() {
        Some(p) => p.to_path_buf(),
        None => return Verdict::Skip,
    };
    Verdict::AcceptFile(WorkItem {
        source: path.to_path_buf(),
        dir,
        name: base_name(&name).to_string(),
    })
}

/// File name with the last extension stripped (`a.b.png` → `a.b`, `.hidden` → `.hidden`).
pub fn base_name(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(i) => &file_name[..i],
    }
}

/// Rank among sources sharing a base name in one directory; the smallest is the only one
/// processed. JPEG-named sources come first since they are their own full asset, so a
/// normalized `<name>.jpg` never overwrites a user's JPEG. Ties break on file name.
pub fn source_precedence(path: &Path) -> (bool, Option<&OsStr>) {
    (!has_jpeg_extension(path), path.file_name())
}
