//! Slidemill: derive thumbnails, slide images and deep-zoom tiles for an image tree, and write an
//! `images.json` manifest per directory.

pub mod engine;
pub mod imaging;
pub mod pipeline;
pub mod process;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

use log::debug;
use std::path::Path;
use std::sync::Arc;

use crate::imaging::{ImageBackend, RustBackend, TilingEngine, tiler_from_opts};

/// Result alias used by public slidemill API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Process `root` with the built-in engines: the `image`-crate backend and the tiler selected by
/// `opts.tiler`.
pub fn process_dir(root: &Path, opts: &Opts) -> Result<RunSummary> {
    process_dir_with(root, opts, Arc::new(RustBackend::new()), tiler_from_opts(opts))
}

/// Process `root` with caller-supplied engines (e.g. another tiler, or mocks in tests).
///
/// Returns the [`RunSummary`] unless the run hit a fatal error: a walk failure, or any item
/// failure when `opts.fail_fast` is set.
pub fn process_dir_with(
    root: &Path,
    opts: &Opts,
    backend: Arc<dyn ImageBackend>,
    tiler: Arc<dyn TilingEngine>,
) -> Result<RunSummary> {
    let config_str = format!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        opts
    );
    debug!("{}", config_str);
    process::process_dir_with_engines(root, opts, backend, tiler)
}
