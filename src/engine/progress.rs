//! Progress bar utilities for displaying processing status

use crossbeam_channel::Receiver;
use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};
use std::thread;

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Update the bar's total (the total is only known once the walk finishes). Refreshes the display.
pub fn set_bar_total(pb: &ProgressBar, total: usize) {
    if let Ok(mut bar) = pb.lock() {
        bar.total = total;
        let _ = bar.refresh();
    }
}

/// Create a progress bar; the total starts unknown (0) and is filled in by [`set_bar_total`].
pub fn create_progress_bar(desc: &'static str) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = 0,
        desc = desc,
        animation = Animation::Classic,
        unit = " images"
    )))
}

/// Update progress bar if available.
/// Uses try_lock so the aggregator never waits on the display.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Create a callback that advances the bar.
pub fn progress_callback(bar: &Option<ProgressBar>) -> Option<Box<dyn Fn(usize) + Send>> {
    bar.as_ref().map(|bar| {
        let bar = Arc::clone(bar);
        Box::new(move |n: usize| update_progress_bar(&bar, n)) as Box<dyn Fn(usize) + Send>
    })
}

/// Build the bar and its per-item callback. `path_count_rx` is consumed in a background thread:
/// the main thread is busy draining events, and the walk sends its total when it finishes.
pub fn setup_progress(
    enabled: bool,
    path_count_rx: Receiver<usize>,
) -> (Option<ProgressBar>, Option<Box<dyn Fn(usize) + Send>>) {
    let bar = enabled.then(|| create_progress_bar("Deriving"));
    if let Some(bar) = bar.as_ref() {
        let bar_clone = Arc::clone(bar);
        thread::spawn(move || {
            if let Ok(total) = path_count_rx.recv() {
                set_bar_total(&bar_clone, total);
            }
        });
    }
    let on_resolved = progress_callback(&bar);
    (bar, on_resolved)
}
