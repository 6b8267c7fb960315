//! Pipeline context and channels: shared state passed into the walk thread and workers.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::utils::config::PackagePaths;
use crate::{Event, Opts, WorkItem};

/// First fatal error of the run (walk failure, or an item failure under `fail_fast`).
pub type FirstError = Arc<Mutex<Option<String>>>;

/// Record `msg` as the run's fatal error unless one is already recorded.
pub fn record_first_error(first_error: &FirstError, msg: String) {
    let mut slot = first_error.lock().unwrap_or_else(|e| e.into_inner());
    slot.get_or_insert(msg);
}

/// Shared context for the walk thread: root, classifier input, and the stop/error state.
pub struct PipelineContext {
    pub root: PathBuf,
    pub ignore: Vec<String>,
    pub follow_links: bool,
    pub first_error: FirstError,
    /// Set when production must stop early (fatal item failure under `fail_fast`).
    pub stop: Arc<AtomicBool>,
}

/// Handles returned by [`run_pipeline`](super::run_pipeline): receive events and join when done.
/// `path_count_rx` receives the number of items the walk dispatched when it finishes.
pub struct PipelineHandles {
    pub event_rx: Receiver<Event>,
    pub path_count_rx: Receiver<usize>,
    pub walk_handle: JoinHandle<usize>,
    pub worker_handles: Vec<JoinHandle<()>>,
    pub first_error: FirstError,
}

/// Channels and shared state for the pipeline. The walk thread gets `item_tx`, `event_tx`,
/// `path_count_tx` and `ctx`; workers get `item_rx` and clones of `event_tx`.
pub struct PipelineChannels {
    pub item_tx: Sender<WorkItem>,
    pub item_rx: Receiver<WorkItem>,
    pub event_tx: Sender<Event>,
    pub event_rx: Receiver<Event>,
    pub path_count_tx: Sender<usize>,
    pub path_count_rx: Receiver<usize>,
    pub first_error: FirstError,
    pub stop: Arc<AtomicBool>,
    pub ctx: PipelineContext,
}

pub fn create_pipeline_channels(root: &Path, opts: &Opts) -> PipelineChannels {
    let cap = opts.queue_cap.max(1);
    let (item_tx, item_rx) = bounded::<WorkItem>(cap);
    let (event_tx, event_rx) = bounded::<Event>(cap);
    let (path_count_tx, path_count_rx) = bounded::<usize>(1);
    let first_error: FirstError = Arc::new(Mutex::new(None));
    let stop = Arc::new(AtomicBool::new(false));

    let ctx = PipelineContext {
        root: root.to_path_buf(),
        ignore: PackagePaths::get().ignore_substrings(),
        follow_links: opts.follow_links,
        first_error: Arc::clone(&first_error),
        stop: Arc::clone(&stop),
    };

    PipelineChannels {
        item_tx,
        item_rx,
        event_tx,
        event_rx,
        path_count_tx,
        path_count_rx,
        first_error,
        stop,
        ctx,
    }
}
