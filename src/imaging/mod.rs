//! Image-engine capability: decode, colorspace normalization, resampling, JPEG encoding and
//! deep-zoom tiling.
//!
//! The pipeline only talks to the two traits here, so engines can be swapped (or mocked in
//! tests) without touching derivation logic:
//!
//! - [`ImageBackend`]: decode / to sRGB / resample / encode. [`RustBackend`] uses the `image` crate.
//! - [`TilingEngine`]: writes `<base>_files/` plus a `<base>.dzi` descriptor.
//!   [`NativeDeepZoom`] builds the pyramid in-process; [`VipsDzSave`] shells out to `vips dzsave`.

pub mod backend;
pub mod calculations;
pub mod tiling;

pub use backend::{DecodedImage, ImageBackend, RustBackend};
pub use calculations::fit_to_height;
pub use tiling::{NativeDeepZoom, TilingEngine, VipsDzSave, dzi_path_for, tile_dir_for};

use std::sync::Arc;

use crate::{Opts, TilerKind};

/// Build the tiling engine selected in `opts`.
pub fn tiler_from_opts(opts: &Opts) -> Arc<dyn TilingEngine> {
    match opts.tiler {
        TilerKind::Native => Arc::new(NativeDeepZoom::new(opts.jpeg)),
        TilerKind::Vips => Arc::new(VipsDzSave::new(opts.vips_bin.clone())),
    }
}
