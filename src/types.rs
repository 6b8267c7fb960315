//! Public and internal types for the slidemill API and pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::utils::config::{DEFAULT_QUEUE_CAP, DeepZoomConsts, JpegProfile, Thresholds};

/// One candidate source image, created by the walker and consumed by exactly one worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItem {
    /// Absolute path of the source file.
    pub source: PathBuf,
    /// Directory that owns the item; its manifest receives the record.
    pub dir: PathBuf,
    /// File name with the extension stripped; the manifest key.
    pub name: String,
}

/// Derived-asset metadata for one processed image. Serialized as one value of `images.json`.
///
/// `width`/`height` are the slide image's dimensions once a slide exists; `max_width`/`max_height`
/// keep the source resolution and are only present when a tile pyramid was generated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub full_path: PathBuf,
    pub thumb_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<u32>,
}

/// Base name → record for one directory. Keys are sorted so the written file does not depend on
/// the order results arrived in.
pub type DirectoryManifest = BTreeMap<String, ImageRecord>;

/// Terminal outcome of one work item. Failures carry the error text.
#[derive(Debug)]
pub struct Outcome {
    pub item: WorkItem,
    pub result: Result<ImageRecord, String>,
}

/// Everything the aggregator hears about: directories the walker has finished with, and item outcomes.
#[derive(Debug)]
pub enum Event {
    /// The walker emitted its last item for `dir`; `expected` items were dispatched for it.
    Sealed { dir: PathBuf, expected: usize },
    /// A worker resolved one item.
    Resolved(Outcome),
}

/// Which tiling engine produces deep-zoom pyramids.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TilerKind {
    /// In-process pyramid writer.
    #[default]
    Native,
    /// Shell out to `vips dzsave`.
    Vips,
}

/// Options for a run (CLI and lib).
#[derive(Clone, Debug)]
pub struct Opts {
    /// Override worker thread count. When None, uses the available parallelism.
    pub num_threads: Option<usize>,
    /// Capacity of the bounded item queue.
    pub queue_cap: usize,
    /// Derivation thresholds.
    pub thresholds: Thresholds,
    /// JPEG export profile for every derived raster.
    pub jpeg: JpegProfile,
    /// Tiling engine.
    pub tiler: TilerKind,
    /// `vips` executable used by [`TilerKind::Vips`].
    pub vips_bin: PathBuf,
    /// Follow symbolic links while walking.
    pub follow_links: bool,
    /// Abort the run on the first item failure instead of skipping the item.
    pub fail_fast: bool,
    /// Debug logging and per-failure listing.
    pub verbose: bool,
    /// Show a progress bar.
    pub progress: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            num_threads: None,
            queue_cap: DEFAULT_QUEUE_CAP,
            thresholds: Thresholds::default(),
            jpeg: JpegProfile::default(),
            tiler: TilerKind::default(),
            vips_bin: PathBuf::from(DeepZoomConsts::VIPS_BINARY),
            follow_links: false,
            fail_fast: false,
            verbose: false,
            progress: false,
        }
    }
}

/// What a run produced. Returned by [`process_dir`](crate::process_dir) when the run was not fatal.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Items that produced a record.
    pub processed: usize,
    /// Items that failed, with the error text.
    pub failed_items: Vec<(PathBuf, String)>,
    /// Directories whose `images.json` was written.
    pub manifests_written: Vec<PathBuf>,
    /// Directories whose `images.json` could not be written, with the error text.
    pub manifest_failures: Vec<(PathBuf, String)>,
}

impl RunSummary {
    /// True when every item and every manifest succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed_items.is_empty() && self.manifest_failures.is_empty()
    }
}
