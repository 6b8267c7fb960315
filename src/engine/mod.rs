//! Engine module: CLI, per-item derivation, manifest output, progress

pub mod arg_parser;
pub mod cli;
pub mod derive;
pub mod manifest;
pub mod progress;
pub mod tools;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use cli::{build_opts, handle_run};
pub use derive::{DerivedPaths, Deriver, has_jpeg_extension};
pub use manifest::{manifest_path, read_manifest, render_manifest, write_manifest};
pub use tools::{check_root_and_canonicalize, worker_count};
