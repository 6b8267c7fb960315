//! Pipeline components: classifier, walk loop, derive workers, directory aggregator.

pub mod aggregate;
pub mod classify;
pub mod context;
pub mod error_handler;
pub mod orchestrator;
pub mod walk;
pub mod workers;

pub use aggregate::{Aggregator, run_aggregator};
pub use classify::{Verdict, base_name, classify, source_precedence};
pub use context::{
    FirstError, PipelineChannels, PipelineContext, PipelineHandles, create_pipeline_channels,
    record_first_error,
};
pub use error_handler::check_for_fatal_error_or_failed_items;
pub use orchestrator::{run_pipeline, shutdown_pipeline_handles};
pub use walk::{WalkOutcome, run_walk_loop, spawn_walk_thread, to_outcome_walkdir};
pub use workers::{FailurePolicy, spawn_derive_workers};
