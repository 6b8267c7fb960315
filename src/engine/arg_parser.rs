use clap::Parser;
use std::path::PathBuf;

use crate::TilerKind;

/// Derive thumbnails, slide images and deep-zoom tiles for an image tree.
#[derive(Clone, Parser)]
#[command(name = "slidemill")]
#[command(
    about = "Walk DIR, derive thumbnails/slides/tiles for every image, and write images.json per directory."
)]
pub struct Cli {
    /// Root directory to process.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Worker thread count. Default: available parallelism.
    #[arg(long, short = 'j')]
    pub threads: Option<usize>,

    /// Capacity of the item queue between the walker and the workers.
    #[arg(long)]
    pub queue_cap: Option<usize>,

    /// Thumbnail height in pixels.
    #[arg(long)]
    pub thumbnail_height: Option<u32>,

    /// Slide image height in pixels; larger sources get a slide image.
    #[arg(long)]
    pub slide_height: Option<u32>,

    /// Sources with a side above this get a deep-zoom tile pyramid.
    #[arg(long)]
    pub tile_min_dimension: Option<u32>,

    /// JPEG quality for derived images.
    #[arg(long, short = 'q', value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Tiling engine.
    #[arg(long, value_enum)]
    pub tiler: Option<TilerKind>,

    /// Path to the vips executable (with --tiler vips).
    #[arg(long)]
    pub vips_bin: Option<PathBuf>,

    /// Follow symbolic links.
    #[arg(long, short = 'f', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub follow_links: Option<bool>,

    /// Abort the run on the first image that fails instead of skipping it.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub fail_fast: Option<bool>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Show a progress bar.
    #[arg(long, short = 'p', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub progress: Option<bool>,
}
