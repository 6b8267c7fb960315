use crossbeam_channel::{Receiver, Sender};
use log::{info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crate::engine::derive::Deriver;
use crate::{Event, Outcome, WorkItem};

use super::context::{FirstError, record_first_error};

/// Per-worker failure policy.
#[derive(Clone)]
pub struct FailurePolicy {
    /// Treat an item failure as fatal: record it and stop the walk.
    pub fail_fast: bool,
    pub first_error: FirstError,
    pub stop: Arc<AtomicBool>,
}

/// Single derive worker: take items from `item_rx`, derive, publish the outcome on `event_tx`.
/// Exits when the item queue is closed and drained.
fn derive_worker_loop(
    worker_id: usize,
    item_rx: Receiver<WorkItem>,
    event_tx: Sender<Event>,
    deriver: Deriver,
    policy: FailurePolicy,
) {
    while let Ok(item) = item_rx.recv() {
        info!("{} - {}", worker_id, item.source.display());
        let result = deriver.derive(&item).map_err(|e| format!("{:#}", e));
        if let Err(ref msg) = result {
            warn!("Failed {}: {}", item.source.display(), msg);
            if policy.fail_fast {
                record_first_error(
                    &policy.first_error,
                    format!("{}: {}", item.source.display(), msg),
                );
                policy.stop.store(true, Ordering::Relaxed);
            }
        }
        if event_tx.send(Event::Resolved(Outcome { item, result })).is_err() {
            break;
        }
    }
    drop(event_tx);
}

/// Spawn `num_threads` derive workers. Caller must drop its own `event_tx` after this so the
/// event stream closes once the walk and every worker are done.
pub fn spawn_derive_workers(
    item_rx: Receiver<WorkItem>,
    event_tx: &Sender<Event>,
    deriver: &Deriver,
    policy: &FailurePolicy,
    num_threads: usize,
) -> Vec<JoinHandle<()>> {
    (0..num_threads.max(1))
        .map(|worker_id| {
            let item_rx = item_rx.clone();
            let event_tx = event_tx.clone();
            let deriver = deriver.clone();
            let policy = policy.clone();
            thread::spawn(move || derive_worker_loop(worker_id, item_rx, event_tx, deriver, policy))
        })
        .collect()
}
