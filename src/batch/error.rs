/// Error types for batch operations.
///
/// Per-document failures never surface here; they become failed
/// [`ProcessingResult`](crate::batch::ProcessingResult)s. These errors abort a
/// whole call.
use crate::batch::config::ConfigError;
use crate::replace::ReplaceError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for batch operations.
pub type Result<T> = std::result::Result<T, BatchError>;

#[derive(Error, Debug)]
pub enum BatchError {
    /// A rule violates the replacement contract
    #[error("Invalid rule: {0}")]
    Replace(#[from] ReplaceError),

    /// A batch is already in flight on this processor
    #[error("A batch is already running on this processor")]
    AlreadyRunning,

    /// The worker pool could not be started
    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// Directory discovery failed
    #[error("Cannot read directory {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
