use anyhow::Result;

use crate::{Opts, RunSummary};

use super::context::FirstError;

/// Check pipeline result: if a fatal error was recorded, return it; otherwise report item
/// failures. Call after the event stream is drained and all threads are joined.
pub fn check_for_fatal_error_or_failed_items(
    opts: &Opts,
    first_error: &FirstError,
    summary: &RunSummary,
) -> Result<()> {
    if let Some(msg) = first_error
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .take()
    {
        return Err(anyhow::anyhow!("{}", msg));
    }
    let failed = summary.failed_items.len();
    if failed > 0 {
        log::warn!("Skipped {} images that could not be processed", failed);
        if opts.verbose {
            for (p, msg) in &summary.failed_items {
                eprintln!("  failed: {}: {}", p.display(), msg);
            }
        }
    }
    Ok(())
}
