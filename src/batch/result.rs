use serde::Serialize;
use std::path::{Path, PathBuf};

pub const MSG_SUCCESS: &str = "Successfully processed";
pub const MSG_INVALID: &str = "Invalid or unreadable DOCX file";
pub const MSG_CANCELLED: &str = "Processing cancelled";

/// Outcome of processing one document. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingResult {
    pub path: PathBuf,
    pub success: bool,
    pub message: String,
    pub replacements: usize,
    /// Set whenever a backup was made, even if a later step failed.
    pub backup_path: Option<PathBuf>,
}

impl ProcessingResult {
    pub fn succeeded(path: &Path, replacements: usize, backup_path: Option<PathBuf>) -> Self {
        Self {
            path: path.to_path_buf(),
            success: true,
            message: MSG_SUCCESS.to_string(),
            replacements,
            backup_path,
        }
    }

    pub fn failed(path: &Path, message: impl Into<String>, backup_path: Option<PathBuf>) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            message: message.into(),
            replacements: 0,
            backup_path,
        }
    }

    /// File name for display, falling back to the full path.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Aggregate view over a result log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_replacements: usize,
    /// `successful / total`, or 0 for an empty batch.
    pub success_rate: f64,
}

impl BatchSummary {
    pub fn from_results(results: &[ProcessingResult]) -> Self {
        let total = results.len();
        let successful = results.iter().filter(|r| r.success).count();
        let total_replacements = results.iter().map(|r| r.replacements).sum();
        let success_rate = if total > 0 {
            successful as f64 / total as f64
        } else {
            0.0
        };
        Self {
            total,
            successful,
            failed: total - successful,
            total_replacements,
            success_rate,
        }
    }
}
