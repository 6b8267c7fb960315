//! Deep-zoom tile pyramid generation.
//!
//! Both engines leave the same layout behind for `output_base = <dir>/<name>`:
//! a `<dir>/<name>_files/<level>/<col>_<row>.<ext>` tree and a `<dir>/<name>.dzi` descriptor.
//! The descriptor is incidental; the derivation engine deletes it.

use anyhow::{Context, Result, bail};
use image::DynamicImage;
use image::imageops::FilterType;
use log::debug;
use rayon::prelude::*;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::utils::config::{DeepZoomConsts, JpegProfile, OutputNames};

use super::backend::{ImageBackend, RustBackend};
use super::calculations::{deep_zoom_level_size, deep_zoom_max_level, deep_zoom_tile_rect};

/// Writes a deep-zoom pyramid for `src` under `output_base`.
pub trait TilingEngine: Send + Sync {
    fn generate(&self, src: &Path, output_base: &Path) -> Result<()>;
}

/// `<base>_files`
pub fn tile_dir_for(output_base: &Path) -> PathBuf {
    append_to_path(output_base, OutputNames::TILE_DIR_SUFFIX)
}

/// `<base>.dzi`
pub fn dzi_path_for(output_base: &Path) -> PathBuf {
    append_to_path(output_base, &format!(".{}", OutputNames::DZI_EXT))
}

fn append_to_path(base: &Path, suffix: &str) -> PathBuf {
    let mut s = OsString::from(base.as_os_str());
    s.push(suffix);
    PathBuf::from(s)
}

// ---- vips ----

/// Shells out to `vips dzsave <src> <base> --centre`.
#[derive(Clone, Debug)]
pub struct VipsDzSave {
    binary: PathBuf,
}

impl VipsDzSave {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }
}

impl TilingEngine for VipsDzSave {
    fn generate(&self, src: &Path, output_base: &Path) -> Result<()> {
        let output = Command::new(&self.binary)
            .arg("dzsave")
            .arg(src)
            .arg(output_base)
            .arg("--centre")
            .output()
            .with_context(|| format!("run {} dzsave", self.binary.display()))?;
        if !output.status.success() {
            bail!(
                "{} dzsave {} failed ({}): {}",
                self.binary.display(),
                src.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

// ---- in-process ----

/// In-process Deep Zoom writer: 254px tiles, 1px overlap, JPEG tiles, grid anchored top-left.
/// Tiles within a level are encoded in parallel.
#[derive(Clone, Debug)]
pub struct NativeDeepZoom {
    backend: RustBackend,
    profile: JpegProfile,
    tile_size: u32,
    overlap: u32,
}

impl NativeDeepZoom {
    pub fn new(profile: JpegProfile) -> Self {
        Self {
            backend: RustBackend::new(),
            profile,
            tile_size: DeepZoomConsts::TILE_SIZE,
            overlap: DeepZoomConsts::OVERLAP,
        }
    }

    fn write_level(&self, image: &DynamicImage, level_dir: &Path) -> Result<()> {
        fs::create_dir_all(level_dir)
            .with_context(|| format!("create tile level {}", level_dir.display()))?;
        let (w, h) = (image.width(), image.height());
        let cols = w.div_ceil(self.tile_size);
        let rows = h.div_ceil(self.tile_size);
        let tiles: Vec<(u32, u32)> = (0..cols)
            .flat_map(|c| (0..rows).map(move |r| (c, r)))
            .collect();
        tiles.par_iter().try_for_each(|&(col, row)| {
            let (x, y, tw, th) =
                deep_zoom_tile_rect(col, row, w, h, self.tile_size, self.overlap);
            let tile = image.crop_imm(x, y, tw, th);
            let bytes = self.backend.encode_jpeg(&tile, &self.profile)?;
            let path = level_dir.join(format!(
                "{col}_{row}.{}",
                DeepZoomConsts::TILE_FORMAT
            ));
            fs::write(&path, bytes).with_context(|| format!("write tile {}", path.display()))
        })
    }

    fn descriptor(&self, width: u32, height: u32) -> String {
        format!(
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
                "<Image xmlns=\"http://schemas.microsoft.com/deepzoom/2008\"\n",
                "  Format=\"{}\"\n",
                "  Overlap=\"{}\"\n",
                "  TileSize=\"{}\"\n",
                "  >\n",
                "  <Size \n",
                "    Height=\"{}\"\n",
                "    Width=\"{}\"\n",
                "  />\n",
                "</Image>\n"
            ),
            DeepZoomConsts::TILE_FORMAT,
            self.overlap,
            self.tile_size,
            height,
            width
        )
    }
}

impl TilingEngine for NativeDeepZoom {
    fn generate(&self, src: &Path, output_base: &Path) -> Result<()> {
        let decoded = self.backend.decode(src)?;
        let mut current = self.backend.to_srgb(decoded.image);
        let (width, height) = (current.width(), current.height());
        let max_level = deep_zoom_max_level(width, height);
        let tile_dir = tile_dir_for(output_base);
        debug!(
            "Tiling {} ({}x{}, {} levels) into {}",
            src.display(),
            width,
            height,
            max_level + 1,
            tile_dir.display()
        );

        for level in (0..=max_level).rev() {
            let (lw, lh) = deep_zoom_level_size(width, height, level, max_level);
            if (current.width(), current.height()) != (lw, lh) {
                current = current.resize_exact(lw, lh, FilterType::Triangle);
            }
            self.write_level(&current, &tile_dir.join(level.to_string()))?;
        }

        let dzi = dzi_path_for(output_base);
        fs::write(&dzi, self.descriptor(width, height))
            .with_context(|| format!("write {}", dzi.display()))?;
        Ok(())
    }
}
