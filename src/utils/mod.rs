pub mod config;
pub mod logger;
pub mod slidemill_toml;
pub mod tempfiles;

pub use config::*;
pub use logger::setup_logging;
pub use slidemill_toml::{
    SlidemillToml, apply_file_to_opts, load_slidemill_toml, parse_slidemill_toml,
};
pub use tempfiles::{temp_path_for, write_atomic};
