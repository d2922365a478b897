mod batch;
mod config;
mod error;
mod exif_reader;
mod heic_reader;
mod metadata;
mod namer;
mod resolver;
mod sanitize;
mod task;

#[cfg(test)]
mod test_fixtures;

pub const DEFAULT_PATTERN: &str = "%Y%m%d_%H%M%S";

pub use batch::{
    run_batch, spawn_batch, BatchEvent, BatchHandle, BatchRun, BatchSummary, CancelToken,
};
pub use config::{
    app_paths, load_config, save_config, validate_pattern, AppConfig, AppPaths, RenameConfig,
    DEFAULT_EXTENSIONS,
};
pub use error::{PatternError, TaskError};
pub use metadata::{ResolvedTimestamp, TimestampSource};
pub use namer::synthesize_target;
pub use resolver::resolve_timestamp;
pub use task::{FileTask, TaskOutcome, TaskStatus};
