use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::Opts;
use crate::engine::derive::Deriver;
use crate::pipeline;

/// Start the walk + derive pipeline for an already-canonical `root`. Returns the event receiver
/// and handles; the caller drains `event_rx` and must then join `walk_handle` and `worker_handles`.
pub fn run_pipeline(
    root: &Path,
    opts: &Opts,
    deriver: &Deriver,
    num_threads: usize,
) -> Result<pipeline::PipelineHandles> {
    let channels = pipeline::create_pipeline_channels(root, opts);
    debug!(
        "Starting {} workers, queue capacity {}",
        num_threads, opts.queue_cap
    );

    let policy = pipeline::FailurePolicy {
        fail_fast: opts.fail_fast,
        first_error: channels.first_error.clone(),
        stop: channels.stop.clone(),
    };
    let worker_handles = pipeline::spawn_derive_workers(
        channels.item_rx,
        &channels.event_tx,
        deriver,
        &policy,
        num_threads,
    );

    let walk_handle = pipeline::spawn_walk_thread(
        channels.item_tx,
        channels.event_tx,
        channels.path_count_tx,
        channels.ctx,
    );

    Ok(pipeline::PipelineHandles {
        event_rx: channels.event_rx,
        path_count_rx: channels.path_count_rx,
        walk_handle,
        worker_handles,
        first_error: channels.first_error,
    })
}

/// Join walk and worker threads (after the event stream is drained). Returns the walk's item count.
pub fn shutdown_pipeline_handles(
    walk_handle: std::thread::JoinHandle<usize>,
    worker_handles: Vec<std::thread::JoinHandle<()>>,
) -> Result<usize> {
    let path_count = walk_handle
        .join()
        .map_err(|_| anyhow::anyhow!("walk thread panicked"))?;
    for h in worker_handles {
        h.join()
            .map_err(|_| anyhow::anyhow!("derive worker panicked"))?;
    }
    Ok(path_count)
}
