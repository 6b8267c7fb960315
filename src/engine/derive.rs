//! Derivation engine: turns one work item into an [`ImageRecord`] by driving the image engine.
//!
//! Per item: decode, normalize the full-size asset if the source is not already JPEG, then run
//! thumbnail, slide and tiling as three joined subtasks over the same decoded image. The image is
//! borrowed by all three and dropped once they have all returned, so a failing subtask never
//! leaves another one running.

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::imaging::{ImageBackend, TilingEngine, dzi_path_for, tile_dir_for};
use crate::utils::config::{JpegProfile, OutputNames, Thresholds};
use crate::utils::write_atomic;
use crate::{ImageRecord, WorkItem};

/// Output paths for one item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedPaths {
    pub full: PathBuf,
    pub thumb: PathBuf,
    pub display: PathBuf,
    /// `<dir>/<name>`; the tiler writes `<base>_files/` and `<base>.dzi`.
    pub tile_base: PathBuf,
}

impl DerivedPaths {
    /// Paths for `item`. `keep_source_as_full` means the source already is the full asset.
    pub fn for_item(item: &WorkItem, keep_source_as_full: bool) -> Self {
        let ext = OutputNames::TARGET_EXT;
        let full = if keep_source_as_full {
            item.source.clone()
        } else {
            item.dir.join(format!("{}.{ext}", item.name))
        };
        Self {
            full,
            thumb: item
                .dir
                .join(format!("{}{}.{ext}", item.name, OutputNames::THUMBNAIL_SUFFIX)),
            display: item
                .dir
                .join(format!("{}{}.{ext}", item.name, OutputNames::DISPLAY_SUFFIX)),
            tile_base: item.dir.join(&item.name),
        }
    }
}

/// True if `path` has a JPEG extension (any case).
pub fn has_jpeg_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

/// Drives the image engine for single items. Cheap to clone; one per worker.
#[derive(Clone)]
pub struct Deriver {
    backend: Arc<dyn ImageBackend>,
    tiler: Arc<dyn TilingEngine>,
    thresholds: Thresholds,
    jpeg: JpegProfile,
}

impl Deriver {
    pub fn new(
        backend: Arc<dyn ImageBackend>,
        tiler: Arc<dyn TilingEngine>,
        thresholds: Thresholds,
        jpeg: JpegProfile,
    ) -> Self {
        Self {
            backend,
            tiler,
            thresholds,
            jpeg,
        }
    }

    /// Produce the record for `item`, writing every derived asset.
    pub fn derive(&self, item: &WorkItem) -> Result<ImageRecord> {
        let decoded = self.backend.decode(&item.source)?;
        // A JPEG-named source is the full asset as-is; it is never rewritten.
        let keep_source = has_jpeg_extension(&item.source);
        if keep_source && decoded.format.is_some_and(|f| f != ImageFormat::Jpeg) {
            warn!(
                "{} holds {:?} data under a JPEG name; using it as the full image unchanged",
                item.source.display(),
                decoded.format
            );
        }
        let paths = DerivedPaths::for_item(item, keep_source);
        let (width, height) = (decoded.width(), decoded.height());
        let image = self.backend.to_srgb(decoded.image);

        if !keep_source {
            info!("Retyping image to jpg: {}", item.source.display());
            self.write_jpeg(&image, &paths.full)?;
        }

        let wants_slide = self.thresholds.wants_slide(width, height);
        let wants_tiles = self.thresholds.wants_tiles(width, height);

        let (thumb, (slide, tiles)) = rayon::join(
            || self.generate_thumbnail(&image, &paths.thumb),
            || {
                rayon::join(
                    || {
                        wants_slide
                            .then(|| self.generate_slide(&image, &paths.display))
                            .transpose()
                    },
                    || {
                        wants_tiles
                            .then(|| self.generate_tiles(&item.source, &paths.tile_base))
                            .transpose()
                    },
                )
            },
        );
        drop(image);

        // Every subtask has finished; report the first failure.
        thumb?;
        let slide = slide?;
        let tiles = tiles?;

        let mut record = ImageRecord {
            full_path: paths.full,
            thumb_path: paths.thumb,
            width,
            height,
            ..Default::default()
        };
        if let Some((w, h)) = slide {
            record.display_path = Some(paths.display);
            record.width = w;
            record.height = h;
        }
        if let Some(tile_dir) = tiles {
            record.tiles = Some(tile_dir);
            record.max_width = Some(width);
            record.max_height = Some(height);
        }
        Ok(record)
    }

    fn write_jpeg(&self, image: &DynamicImage, path: &Path) -> Result<()> {
        let bytes = self.backend.encode_jpeg(image, &self.jpeg)?;
        write_atomic(path, &bytes)
    }

    /// Grid thumbnail at the thumbnail height.
    fn generate_thumbnail(&self, image: &DynamicImage, path: &Path) -> Result<()> {
        let thumb = self.backend.thumbnail(
            image,
            self.thresholds.max_width,
            self.thresholds.thumbnail_height,
        );
        self.write_jpeg(&thumb, path)
            .with_context(|| format!("thumbnail {}", path.display()))
    }

    /// Slide image at the slide height. Returns its actual dimensions.
    fn generate_slide(&self, image: &DynamicImage, path: &Path) -> Result<(u32, u32)> {
        let slide = self.backend.thumbnail(
            image,
            self.thresholds.max_width,
            self.thresholds.slide_height,
        );
        self.write_jpeg(&slide, path)
            .with_context(|| format!("slide image {}", path.display()))?;
        Ok((slide.width(), slide.height()))
    }

    /// Tile pyramid from the source. Returns the tile directory; the descriptor is removed.
    fn generate_tiles(&self, source: &Path, base: &Path) -> Result<PathBuf> {
        info!("Generating tiles for {}", source.display());
        self.tiler
            .generate(source, base)
            .with_context(|| format!("tiles for {}", source.display()))?;
        let dzi = dzi_path_for(base);
        if let Err(e) = fs::remove_file(&dzi) {
            warn!("Could not remove {}: {}", dzi.display(), e);
        }
        Ok(tile_dir_for(base))
    }
}
