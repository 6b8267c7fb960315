//! Load `.slidemill.toml` from the root directory (CLI only). Lib callers pass [`Opts`] directly.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{Opts, TilerKind};

use super::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct SlidemillToml {
    #[serde(default)]
    settings: Settings,
}

#[derive(Debug, Default, Deserialize)]
struct Settings {
    threads: Option<usize>,
    queue_cap: Option<usize>,
    thumbnail_height: Option<u32>,
    slide_height: Option<u32>,
    tile_min_dimension: Option<u32>,
    quality: Option<u8>,
    tiler: Option<TilerKind>,
    vips_bin: Option<String>,
    follow_links: Option<bool>,
    fail_fast: Option<bool>,
    verbose: Option<bool>,
    progress: Option<bool>,
}

/// Load the config file from `dir` if present. Returns None if the file is missing; a file that
/// fails to parse is reported and ignored.
pub fn load_slidemill_toml(dir: &Path) -> Option<SlidemillToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_slidemill_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub fn parse_slidemill_toml(s: &str) -> Result<SlidemillToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($set:expr, $opts:expr, $set_field:ident => $($opts_field:ident).+) => {
        if let Some(v) = $set.$set_field {
            $opts.$($opts_field).+ = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI flags.
pub fn apply_file_to_opts(file: &SlidemillToml, opts: &mut Opts) {
    let set = &file.settings;
    if let Some(n) = set.threads {
        opts.num_threads = Some(n);
    }
    apply_file_opt!(set, opts, queue_cap => queue_cap);
    apply_file_opt!(set, opts, thumbnail_height => thresholds.thumbnail_height);
    apply_file_opt!(set, opts, slide_height => thresholds.slide_height);
    apply_file_opt!(set, opts, tile_min_dimension => thresholds.tile_min_dimension);
    apply_file_opt!(set, opts, quality => jpeg.quality);
    if let Some(ref t) = set.tiler {
        opts.tiler = t.clone();
    }
    if let Some(ref p) = set.vips_bin {
        opts.vips_bin = PathBuf::from(p);
    }
    apply_file_opt!(set, opts, follow_links => follow_links);
    apply_file_opt!(set, opts, fail_fast => fail_fast);
    apply_file_opt!(set, opts, verbose => verbose);
    apply_file_opt!(set, opts, progress => progress);
}
