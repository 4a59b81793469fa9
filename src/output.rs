//! Result types returned by the conversion entry points.

use crate::config::Strategy;
use crate::error::FileError;
use crate::pipeline::preprocess::TableChange;
use crate::pipeline::validate::ValidationReport;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output of converting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Converted text in the target format.
    pub text: String,
    /// Where the text was written, if it was.
    pub output_path: Option<PathBuf>,
    /// Writer name of the final hop.
    pub format: String,
    /// Strategy that produced the text.
    pub strategy: Strategy,
    /// Preprocessing rules that fired on the intermediate HTML.
    /// Empty for the direct strategy or when preprocessing is disabled.
    pub changes: Vec<TableChange>,
    /// Validation of the intermediate HTML *before* preprocessing.
    pub validation: Option<ValidationReport>,
    /// Intermediate HTML kept on disk at the caller's request.
    pub intermediate_path: Option<PathBuf>,
    pub stats: ConversionStats,
}

/// Wall-clock timings for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_duration_ms: u64,
    /// Source → HTML (two-step only).
    pub html_hop_ms: u64,
    /// Final hop to the target format.
    pub target_hop_ms: u64,
}

/// Outcome for one file of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub input: PathBuf,
    /// Planned output path (written only on success).
    pub output: PathBuf,
    /// Preprocessing changes, when the two-step strategy ran.
    pub changes: Vec<TableChange>,
    pub duration_ms: u64,
    pub error: Option<FileError>,
}

impl FileResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Output of a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutput {
    /// Per-file results in input order.
    pub files: Vec<FileResult>,
    pub stats: BatchStats,
}

impl BatchOutput {
    /// Files that failed, in input order.
    pub fn failures(&self) -> impl Iterator<Item = &FileResult> {
        self.files.iter().filter(|f| !f.is_success())
    }
}

/// Aggregate counts for a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub matched: usize,
    pub converted: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
}
