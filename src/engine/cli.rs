//! CLI command handler: build options (defaults < `.slidemill.toml` < flags) and run.

use anyhow::{Result, bail};
use log::{info, warn};

use crate::engine::arg_parser::Cli;
use crate::process_dir;
use crate::utils::{apply_file_to_opts, load_slidemill_toml, setup_logging};
use crate::{Opts, RunSummary};

/// Overwrite opts field from a CLI flag when given.
macro_rules! apply_cli_opt {
    ($cli:expr, $opts:expr, $cli_field:ident => $($opts_field:ident).+) => {
        if let Some(v) = $cli.$cli_field.clone() {
            $opts.$($opts_field).+ = v;
        }
    };
}

/// Build [`Opts`] for `cli`: defaults, then the config file in DIR, then CLI flags.
pub fn build_opts(cli: &Cli) -> Opts {
    let mut opts = Opts::default();
    if let Some(file) = load_slidemill_toml(&cli.dir) {
        apply_file_to_opts(&file, &mut opts);
    }
    if cli.threads.is_some() {
        opts.num_threads = cli.threads;
    }
    apply_cli_opt!(cli, opts, queue_cap => queue_cap);
    apply_cli_opt!(cli, opts, thumbnail_height => thresholds.thumbnail_height);
    apply_cli_opt!(cli, opts, slide_height => thresholds.slide_height);
    apply_cli_opt!(cli, opts, tile_min_dimension => thresholds.tile_min_dimension);
    apply_cli_opt!(cli, opts, quality => jpeg.quality);
    apply_cli_opt!(cli, opts, tiler => tiler);
    apply_cli_opt!(cli, opts, vips_bin => vips_bin);
    apply_cli_opt!(cli, opts, follow_links => follow_links);
    apply_cli_opt!(cli, opts, fail_fast => fail_fast);
    apply_cli_opt!(cli, opts, verbose => verbose);
    apply_cli_opt!(cli, opts, progress => progress);
    opts
}

fn report(summary: &RunSummary) {
    info!(
        "Processed {} images, wrote {} manifests",
        summary.processed,
        summary.manifests_written.len()
    );
    if !summary.failed_items.is_empty() {
        warn!("{} images failed", summary.failed_items.len());
    }
}

/// Process `cli.dir`. Errors on a fatal run error or when any manifest could not be written.
pub fn handle_run(cli: &Cli) -> Result<()> {
    setup_logging(cli.verbose.unwrap_or(false));
    let opts = build_opts(cli);
    info!("Building image file list...");
    let summary = process_dir(&cli.dir, &opts)?;
    report(&summary);
    if !summary.manifest_failures.is_empty() {
        bail!(
            "{} manifests could not be written",
            summary.manifest_failures.len()
        );
    }
    Ok(())
}
