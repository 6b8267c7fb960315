//! Application configuration constants.
//! Thresholds, naming conventions and tuning in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    config_filename: String,
    temp_marker: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                config_filename: format!(".{pkg}.toml"),
                temp_marker: format!(".{pkg}-tmp"),
            }
        })
    }

    /// Per-tree config file looked up in the root directory (CLI only).
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Suffix appended to files while they are being written, before the rename.
    pub fn temp_marker(&self) -> &str {
        &self.temp_marker
    }

    /// Substrings that make the classifier skip an entry. Covers the OS sentinel, every artifact
    /// this pipeline writes (thumbnails, slides, tile descriptors, manifests) plus markup/metadata
    /// files that can sit next to images, and our own config and temp files.
    pub fn ignore_substrings(&self) -> Vec<String> {
        let mut v: Vec<String> = [".DS_Store", "thumbnail", "display", "html", "dzi", "json", "xml"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        v.push(self.config_filename().to_string());
        v.push(self.temp_marker().to_string());
        v
    }
}

// ---- Output naming ----

/// Naming of derived assets written next to each source image.
pub struct OutputNames;

impl OutputNames {
    /// Per-directory manifest.
    pub const MANIFEST_FILENAME: &'static str = "images.json";
    /// Extension of every derived raster (the pipeline's target encoding).
    pub const TARGET_EXT: &'static str = "jpg";
    pub const THUMBNAIL_SUFFIX: &'static str = "-thumbnail";
    pub const DISPLAY_SUFFIX: &'static str = "-display";
    /// Directory suffix of a deep-zoom tile pyramid (`<name>_files`). Directories ending in it are pruned.
    pub const TILE_DIR_SUFFIX: &'static str = "_files";
    /// Extension of the deep-zoom descriptor the tiler leaves beside the tile directory.
    pub const DZI_EXT: &'static str = "dzi";
}

// ---- Derivation thresholds ----

/// Pixel thresholds for the derived assets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thresholds {
    /// Height of the grid thumbnail.
    pub thumbnail_height: u32,
    /// Height of the slide image; also the dimension a source must exceed to get one.
    pub slide_height: u32,
    /// A source with either dimension above this gets a tile pyramid.
    pub tile_min_dimension: u32,
    /// Width cap when resampling to a target height.
    pub max_width: u32,
}

impl Thresholds {
    pub const THUMBNAIL_HEIGHT: u32 = 400;
    pub const SLIDE_HEIGHT: u32 = 2000;
    pub const TILE_MIN_DIMENSION: u32 = 4100;
    pub const MAX_WIDTH: u32 = i16::MAX as u32;

    /// True if either dimension is above the slide threshold.
    pub fn wants_slide(&self, width: u32, height: u32) -> bool {
        width > self.slide_height || height > self.slide_height
    }

    /// True if either dimension is above the tiling threshold.
    pub fn wants_tiles(&self, width: u32, height: u32) -> bool {
        width > self.tile_min_dimension || height > self.tile_min_dimension
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            thumbnail_height: Self::THUMBNAIL_HEIGHT,
            slide_height: Self::SLIDE_HEIGHT,
            tile_min_dimension: Self::TILE_MIN_DIMENSION,
            max_width: Self::MAX_WIDTH,
        }
    }
}

// ---- JPEG export profile ----

/// Chroma subsampling mode requested from the encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subsample {
    Auto,
    On,
    Off,
}

/// JPEG export profile shared by every derived raster.
///
/// The in-process encoder honours `quality`; the remaining switches describe the full profile
/// for engines that expose them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JpegProfile {
    pub quality: u8,
    pub strip_metadata: bool,
    pub interlace: bool,
    pub optimize_coding: bool,
    pub subsample: Subsample,
    pub trellis_quant: bool,
    pub overshoot_deringing: bool,
    pub optimize_scans: bool,
    pub quant_table: u8,
}

impl JpegProfile {
    pub const QUALITY: u8 = 75;
    pub const QUANT_TABLE: u8 = 3;
}

impl Default for JpegProfile {
    fn default() -> Self {
        Self {
            quality: Self::QUALITY,
            strip_metadata: true,
            interlace: true,
            optimize_coding: true,
            subsample: Subsample::Auto,
            trellis_quant: true,
            overshoot_deringing: true,
            optimize_scans: true,
            quant_table: Self::QUANT_TABLE,
        }
    }
}

// ---- Deep zoom ----

/// Layout of the in-process deep-zoom pyramid (same defaults as `vips dzsave`).
pub struct DeepZoomConsts;

impl DeepZoomConsts {
    pub const TILE_SIZE: u32 = 254;
    pub const OVERLAP: u32 = 1;
    pub const TILE_FORMAT: &'static str = "jpeg";
    pub const VIPS_BINARY: &'static str = "vips";
}

// ---- Queue ----

/// Capacity of the bounded item queue and of the event stream. The walker blocks when the
/// item queue is full.
pub const DEFAULT_QUEUE_CAP: usize = 100;
