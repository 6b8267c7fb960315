//! Directory aggregator: groups outcomes by owning directory and writes each directory's
//! manifest exactly once, as soon as the walk has sealed it and every dispatched item resolved.

use crossbeam_channel::Receiver;
use log::{error, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::engine::manifest::write_manifest;
use crate::{DirectoryManifest, Event, ImageRecord, Outcome, RunSummary};

use super::classify::source_precedence;

/// Accumulated state for one directory.
#[derive(Default)]
struct DirBucket {
    /// Base name → (source path, record). The source is kept for the collision tie-break.
    records: BTreeMap<String, (PathBuf, ImageRecord)>,
    resolved: usize,
    /// Items dispatched for this directory; known once the walk seals it.
    expected: Option<usize>,
}

impl DirBucket {
    fn is_complete(&self) -> bool {
        self.expected == Some(self.resolved)
    }

    /// Insert under `name`. When two sources share a base name, the one ranked first by
    /// [`source_precedence`] wins, whatever order they resolved in.
    fn insert(&mut self, name: String, source: PathBuf, record: ImageRecord) {
        let keep_existing = self
            .records
            .get(&name)
            .is_some_and(|(existing, _)| {
                source_precedence(existing) <= source_precedence(&source)
            });
        if !keep_existing {
            self.records.insert(name, (source, record));
        }
    }

    fn into_manifest(self) -> DirectoryManifest {
        self.records
            .into_iter()
            .map(|(name, (_, record))| (name, record))
            .collect()
    }
}

/// Per-directory bookkeeping plus the run summary. Single owner; fed one [`Event`] at a time.
pub struct Aggregator {
    buckets: HashMap<PathBuf, DirBucket>,
    summary: RunSummary,
    on_resolved: Option<Box<dyn Fn(usize) + Send>>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Aggregator {
    /// `on_resolved` is called with 1 for every resolved item (progress reporting).
    pub fn new(on_resolved: Option<Box<dyn Fn(usize) + Send>>) -> Self {
        Self {
            buckets: HashMap::new(),
            summary: RunSummary::default(),
            on_resolved,
        }
    }

    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Sealed { dir, expected } => {
                self.buckets.entry(dir.clone()).or_default().expected = Some(expected);
                self.flush_if_complete(dir);
            }
            Event::Resolved(outcome) => self.resolve(outcome),
        }
    }

    fn resolve(&mut self, outcome: Outcome) {
        let Outcome { item, result } = outcome;
        if let Some(cb) = &self.on_resolved {
            cb(1);
        }
        let bucket = self.buckets.entry(item.dir.clone()).or_default();
        bucket.resolved += 1;
        match result {
            Ok(record) => {
                bucket.insert(item.name, item.source, record);
                self.summary.processed += 1;
            }
            Err(msg) => self.summary.failed_items.push((item.source, msg)),
        }
        self.flush_if_complete(item.dir);
    }

    fn flush_if_complete(&mut self, dir: PathBuf) {
        if !self.buckets.get(&dir).is_some_and(DirBucket::is_complete) {
            return;
        }
        let Some(bucket) = self.buckets.remove(&dir) else {
            return;
        };
        match write_manifest(&dir, &bucket.into_manifest()) {
            Ok(_) => self.summary.manifests_written.push(dir),
            Err(e) => {
                error!("{:#}", e);
                self.summary.manifest_failures.push((dir, format!("{:#}", e)));
            }
        }
    }

    /// Directories that have not been written yet (unsealed, or still waiting on items).
    pub fn pending_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.buckets.keys().cloned().collect();
        dirs.sort();
        dirs
    }

    /// End of stream. Directories never completed are reported and left unwritten.
    pub fn finish(self) -> RunSummary {
        for dir in self.pending_dirs() {
            warn!("Manifest for {} not written: directory incomplete", dir.display());
        }
        self.summary
    }
}

/// Drain `event_rx` until the walk and every worker have dropped their senders.
pub fn run_aggregator(
    event_rx: Receiver<Event>,
    on_resolved: Option<Box<dyn Fn(usize) + Send>>,
) -> RunSummary {
    let mut aggregator = Aggregator::new(on_resolved);
    while let Ok(event) = event_rx.recv() {
        aggregator.handle(event);
    }
    aggregator.finish()
}
