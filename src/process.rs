//! Run orchestration: walk → workers → aggregator for one root directory.

use anyhow::Result;
use log::debug;
use std::path::Path;
use std::sync::Arc;

use crate::engine::derive::Deriver;
use crate::engine::progress::setup_progress;
use crate::engine::tools::{check_root_and_canonicalize, worker_count};
use crate::imaging::{ImageBackend, TilingEngine};
use crate::pipeline::{
    PipelineHandles, check_for_fatal_error_or_failed_items, run_aggregator, run_pipeline,
    shutdown_pipeline_handles,
};
use crate::{Opts, RunSummary};

/// Process the tree at `root` with the given image engines.
///
/// Manifests are written per directory as soon as each one is complete. A fatal error (walk
/// failure, or an item failure under `fail_fast`) is returned after in-flight items have drained;
/// manifests already written stay on disk.
pub fn process_dir_with_engines(
    root: &Path,
    opts: &Opts,
    backend: Arc<dyn ImageBackend>,
    tiler: Arc<dyn TilingEngine>,
) -> Result<RunSummary> {
    let root = check_root_and_canonicalize(root)?;
    let num_threads = worker_count(opts.num_threads);
    let deriver = Deriver::new(backend, tiler, opts.thresholds, opts.jpeg);

    let PipelineHandles {
        event_rx,
        path_count_rx,
        walk_handle,
        worker_handles,
        first_error,
    } = run_pipeline(&root, opts, &deriver, num_threads)?;
    let (_bar, on_resolved) = setup_progress(opts.progress, path_count_rx);

    let summary = run_aggregator(event_rx, on_resolved);
    debug!(
        "main: event stream closed, {} processed, {} failed, {} manifests",
        summary.processed,
        summary.failed_items.len(),
        summary.manifests_written.len()
    );

    let path_count = shutdown_pipeline_handles(walk_handle, worker_handles)?;
    debug!("Walk dispatched {} images", path_count);

    check_for_fatal_error_or_failed_items(opts, &first_error, &summary)?;
    Ok(summary)
}
