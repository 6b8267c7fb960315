//! Walk loop: classifies entries, dispatches work items, and tells the aggregator when a
//! directory has received its last item.

use crossbeam_channel::Sender;
use log::{debug, warn};
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};
use walkdir::WalkDir;

use crate::{Event, WorkItem};

use super::classify::{Verdict, base_name, classify, source_precedence};
use super::context::{PipelineContext, record_first_error};

/// One result from a directory walk: an entry to classify, or an error with optional path.
pub enum WalkOutcome {
    Ok {
        path: PathBuf,
        depth: usize,
        is_dir: bool,
    },
    Err {
        msg: String,
        path: Option<PathBuf>,
    },
}

/// Convert a walkdir result into [`WalkOutcome`].
pub fn to_outcome_walkdir(r: Result<walkdir::DirEntry, walkdir::Error>) -> WalkOutcome {
    match r {
        Ok(entry) => WalkOutcome::Ok {
            depth: entry.depth(),
            is_dir: entry.file_type().is_dir(),
            path: entry.into_path(),
        },
        Err(err) => WalkOutcome::Err {
            msg: format!("{}", err),
            path: err.path().map(PathBuf::from),
        },
    }
}

/// Order of entries inside one directory: files before subdirectories, files grouped by base
/// name with the preferred source of each group first, subdirectories by name.
fn walk_order(a: &walkdir::DirEntry, b: &walkdir::DirEntry) -> CmpOrdering {
    let (a_dir, b_dir) = (a.file_type().is_dir(), b.file_type().is_dir());
    a_dir.cmp(&b_dir).then_with(|| {
        if a_dir {
            return a.file_name().cmp(b.file_name());
        }
        let a_name = a.file_name().to_string_lossy();
        let b_name = b.file_name().to_string_lossy();
        base_name(&a_name)
            .cmp(base_name(&b_name))
            .then_with(|| source_precedence(a.path()).cmp(&source_precedence(b.path())))
    })
}

/// Depth-first walk in [`walk_order`]. Skipped and pruned directories are filtered here so their
/// contents are never read. The root itself is always walked, whatever its name.
fn walkdir_iter(ctx: &PipelineContext) -> Box<dyn Iterator<Item = WalkOutcome>> {
    let ignore = ctx.ignore.clone();
    Box::new(
        WalkDir::new(&ctx.root)
            .follow_links(ctx.follow_links)
            .sort_by(walk_order)
            .into_iter()
            .filter_entry(move |e| {
                e.depth() == 0
                    || !matches!(
                        classify(e.path(), e.file_type().is_dir(), &ignore),
                        Verdict::Skip | Verdict::Prune
                    )
            })
            .map(to_outcome_walkdir),
    )
}

pub fn spawn_walk_thread(
    item_tx: Sender<WorkItem>,
    event_tx: Sender<Event>,
    path_count_tx: Sender<usize>,
    ctx: PipelineContext,
) -> JoinHandle<usize> {
    thread::spawn(move || {
        let iter = walkdir_iter(&ctx);
        run_walk_loop(item_tx, event_tx, path_count_tx, ctx, iter)
    })
}

/// A directory the walk is still inside, with the items dispatched for it so far.
struct OpenDir {
    path: PathBuf,
    depth: usize,
    dispatched: usize,
    /// Base names already dispatched; later sources with the same base name are dropped.
    names: HashSet<String>,
}

/// Run the walk loop over `iter` (entries in depth-first pre-order).
///
/// The depth-0 directory is the root and is always accepted. Accepted directories are opened;
/// accepted files whose owner is the innermost open directory are sent on `item_tx` (blocking
/// when the queue is full), one per base name: the first source seen for a name wins. An entry at depth `d` means every open
/// directory at depth `>= d` is finished, so those are sealed with their dispatched count. On a
/// walk error (or when `ctx.stop` is raised) the error is recorded, the loop stops, and directories
/// still open are left unsealed. Sends the total dispatched count on `path_count_tx`, then drops
/// both senders. Returns the count.
pub fn run_walk_loop<I>(
    item_tx: Sender<WorkItem>,
    event_tx: Sender<Event>,
    path_count_tx: Sender<usize>,
    ctx: PipelineContext,
    iter: I,
) -> usize
where
    I: Iterator<Item = WalkOutcome>,
{
    let mut count = 0_usize;
    let mut open: Vec<OpenDir> = Vec::new();
    let mut aborted = false;

    for outcome in iter {
        if ctx.stop.load(Ordering::Relaxed) {
            aborted = true;
            break;
        }
        match outcome {
            WalkOutcome::Ok {
                path,
                depth,
                is_dir,
            } => {
                if !seal_deeper_than(&mut open, depth, &event_tx) {
                    aborted = true;
                    break;
                }
                let verdict = if depth == 0 && is_dir {
                    Verdict::AcceptDir
                } else {
                    classify(&path, is_dir, &ctx.ignore)
                };
                match verdict {
                    Verdict::Skip | Verdict::Prune => {}
                    Verdict::AcceptDir => open.push(OpenDir {
                        path,
                        depth,
                        dispatched: 0,
                        names: HashSet::new(),
                    }),
                    Verdict::AcceptFile(item) => {
                        let Some(owner) = open.last_mut().filter(|d| d.path == item.dir) else {
                            debug!("No open directory for {}, skipping", item.source.display());
                            continue;
                        };
                        if owner.names.contains(&item.name) {
                            debug!(
                                "{} shares base name {:?} with an earlier source, skipping",
                                item.source.display(),
                                item.name
                            );
                            continue;
                        }
                        owner.names.insert(item.name.clone());
                        if item_tx.send(item).is_err() {
                            aborted = true;
                            break;
                        }
                        owner.dispatched += 1;
                        count += 1;
                    }
                }
            }
            WalkOutcome::Err { msg, path } => {
                let msg = match path {
                    Some(p) => format!("walk error at {}: {}", p.display(), msg),
                    None => format!("walk error: {}", msg),
                };
                record_first_error(&ctx.first_error, msg);
                aborted = true;
                break;
            }
        }
    }

    if aborted {
        for dir in &open {
            warn!(
                "Walk stopped inside {}; its manifest will not be written",
                dir.path.display()
            );
        }
    } else {
        seal_deeper_than(&mut open, 0, &event_tx);
    }

    if path_count_tx.send(count).is_err() {
        debug!("Walk count of {} not delivered: no progress listener", count);
    }
    drop(item_tx);
    drop(event_tx);
    count
}

/// Pop and seal every open directory at depth `>= depth`, innermost first.
/// Returns false if the aggregator is gone.
fn seal_deeper_than(open: &mut Vec<OpenDir>, depth: usize, event_tx: &Sender<Event>) -> bool {
    while open.last().is_some_and(|d| d.depth >= depth) {
        let Some(dir) = open.pop() else { break };
        let event = Event::Sealed {
            dir: dir.path,
            expected: dir.dispatched,
        };
        if event_tx.send(event).is_err() {
            return false;
        }
    }
    true
}
