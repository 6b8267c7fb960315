use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;
use std::time::Instant;

/// `slidemill::pipeline::walk` → `pipeline::walk`; foreign targets are kept whole.
fn short_target(target: &str) -> &str {
    target
        .strip_prefix(env!("CARGO_PKG_NAME"))
        .and_then(|t| t.strip_prefix("::"))
        .unwrap_or(target)
}

/// Install the process logger. Called once by the binary; the library only emits through `log`.
///
/// Our crate logs at Info (Debug when `verbose`), dependencies at Warn; `RUST_LOG` still applies.
/// Verbose runs prefix each line with seconds since start.
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let start = Instant::now();

    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), level)
        .format(move |buf, record| {
            let tag = if verbose {
                format!(
                    "{} {:>7.2}s",
                    env!("CARGO_PKG_NAME"),
                    start.elapsed().as_secs_f64()
                )
            } else {
                env!("CARGO_PKG_NAME").to_string()
            };
            let line = match record.level() {
                Level::Error => format!(
                    "[{} {} {}] {}",
                    tag.cyan(),
                    "ERROR".red().bold(),
                    short_target(record.target()).white(),
                    record.args()
                ),
                Level::Warn => format!(
                    "[{} {} {}] {}",
                    tag.cyan(),
                    "WARN".yellow(),
                    short_target(record.target()).white(),
                    record.args()
                ),
                Level::Info => format!("[{}] {}", tag.cyan(), record.args()),
                Level::Debug | Level::Trace => {
                    format!("[{}] {}", tag.cyan(), record.args().to_string().dimmed())
                }
            };
            writeln!(buf, "{}", line)
        })
        .try_init();
}
