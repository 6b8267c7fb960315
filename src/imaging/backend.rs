//! Decode / normalize / resample / encode capability and its `image`-crate implementation.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;

use crate::utils::config::JpegProfile;

use super::calculations::fit_to_height;

/// A decoded source image and the container format it was read from.
#[derive(Debug)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: Option<ImageFormat>,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Image operations the derivation engine needs. Implementations must be shareable across workers.
pub trait ImageBackend: Send + Sync {
    /// Decode the file at `path`.
    fn decode(&self, path: &Path) -> Result<DecodedImage>;

    /// Convert to 8-bit sRGB without alpha, the colour space every derived JPEG is written in.
    fn to_srgb(&self, image: DynamicImage) -> DynamicImage;

    /// Encode `image` as JPEG with `profile`.
    fn encode_jpeg(&self, image: &DynamicImage, profile: &JpegProfile) -> Result<Vec<u8>>;

    /// Resample `image` to `target_height` (width capped at `max_width`, no crop, no upscaling).
    fn thumbnail(&self, image: &DynamicImage, max_width: u32, target_height: u32) -> DynamicImage;
}

/// Pure-Rust backend on the `image` crate. Lanczos3 resampling; baseline JPEG at the profile's quality.
#[derive(Clone, Debug, Default)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<DecodedImage> {
        let reader = ImageReader::open(path)
            .with_context(|| format!("open image {}", path.display()))?
            .with_guessed_format()
            .with_context(|| format!("detect image format {}", path.display()))?;
        let format = reader.format();
        let image = reader
            .decode()
            .with_context(|| format!("decode image {}", path.display()))?;
        Ok(DecodedImage { image, format })
    }

    fn to_srgb(&self, image: DynamicImage) -> DynamicImage {
        match image {
            DynamicImage::ImageRgb8(_) => image,
            other => DynamicImage::ImageRgb8(other.into_rgb8()),
        }
    }

    fn encode_jpeg(&self, image: &DynamicImage, profile: &JpegProfile) -> Result<Vec<u8>> {
        let rgb = image.to_rgb8();
        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, profile.quality);
        encoder.encode_image(&rgb).context("encode jpeg")?;
        Ok(buf)
    }

    fn thumbnail(&self, image: &DynamicImage, max_width: u32, target_height: u32) -> DynamicImage {
        let (w, h) = fit_to_height(image.width(), image.height(), target_height, max_width);
        if (w, h) == (image.width(), image.height()) {
            return image.clone();
        }
        image.resize_exact(w, h, FilterType::Lanczos3)
    }
}
