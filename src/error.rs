//! Error types for the doc2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Doc2MdError`] — **Fatal**: the requested conversion cannot proceed
//!   (input missing, pandoc missing, pandoc rejected the document). Returned
//!   as `Err(Doc2MdError)` from the top-level `convert*` functions.
//!
//! * [`FileError`] — **Non-fatal**: a single file of a batch failed but the
//!   remaining files are fine. Stored inside [`crate::output::FileResult`]
//!   so a batch reports per-file success or failure instead of aborting.
//!
//! A rule in the HTML preprocessor that matches nothing is not an error at
//! all; it is simply skipped.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the doc2md library.
#[derive(Debug, Error)]
pub enum Doc2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Reading a file the library handles itself (HTML, intermediate) failed.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not UTF-8 text, so it cannot be treated as markup.
    #[error("'{path}' is not UTF-8 text and cannot be processed as HTML")]
    NotText { path: PathBuf },

    /// The batch glob pattern could not be compiled.
    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// No pandoc executable could be located.
    #[error("Conversion engine unavailable: {0}")]
    EngineNotFound(String),

    /// The engine binary exists but could not be started.
    #[error("Failed to start '{program}': {source}")]
    EngineSpawnFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran and reported a failure. `message` is its diagnostic
    /// output, verbatim.
    #[error("Conversion of '{input}' to {format} failed: {message}")]
    EngineFailed {
        input: PathBuf,
        format: String,
        message: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the intermediate HTML file between hops.
    #[error("Failed to write intermediate HTML '{path}': {source}")]
    IntermediateWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Doc2MdError {
    /// Whether this error came from the external engine rather than from
    /// the caller's input or the local file system.
    pub fn is_engine_error(&self) -> bool {
        matches!(
            self,
            Doc2MdError::EngineNotFound(_)
                | Doc2MdError::EngineSpawnFailed { .. }
                | Doc2MdError::EngineFailed { .. }
        )
    }
}

impl From<pandoc_locate::LocateError> for Doc2MdError {
    fn from(e: pandoc_locate::LocateError) -> Self {
        Doc2MdError::EngineNotFound(e.to_string())
    }
}

/// A non-fatal error for a single file of a batch.
///
/// Stored alongside [`crate::output::FileResult`] when a file fails.
/// The batch continues with the next file.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The input could not be read.
    #[error("{path}: {detail}")]
    Input { path: PathBuf, detail: String },

    /// The engine rejected the file.
    #[error("{path}: conversion failed: {detail}")]
    Conversion { path: PathBuf, detail: String },

    /// Converted text could not be written.
    #[error("{path}: write failed: {detail}")]
    Output { path: PathBuf, detail: String },
}

impl FileError {
    /// Classify a fatal single-file error into its batch-level counterpart.
    pub fn from_fatal(path: PathBuf, err: &Doc2MdError) -> Self {
        let detail = err.to_string();
        match err {
            Doc2MdError::FileNotFound { .. }
            | Doc2MdError::PermissionDenied { .. }
            | Doc2MdError::ReadFailed { .. }
            | Doc2MdError::NotText { .. } => FileError::Input { path, detail },
            Doc2MdError::OutputWriteFailed { .. } => FileError::Output { path, detail },
            _ => FileError::Conversion { path, detail },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_failed_display_keeps_diagnostic_verbatim() {
        let e = Doc2MdError::EngineFailed {
            input: PathBuf::from("report.docx"),
            format: "html".into(),
            message: "Unknown reader: foo".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("report.docx"), "got: {msg}");
        assert!(msg.contains("Unknown reader: foo"), "got: {msg}");
        assert!(e.is_engine_error());
    }

    #[test]
    fn file_not_found_is_not_engine_error() {
        let e = Doc2MdError::FileNotFound {
            path: PathBuf::from("missing.docx"),
        };
        assert!(!e.is_engine_error());
        assert!(e.to_string().contains("missing.docx"));
    }

    #[test]
    fn locate_error_maps_to_engine_not_found() {
        let e: Doc2MdError = pandoc_locate::LocateError::NotFound { searched: vec![] }.into();
        assert!(matches!(e, Doc2MdError::EngineNotFound(_)));
    }

    #[test]
    fn file_error_classification() {
        let p = PathBuf::from("a.docx");
        let input = FileError::from_fatal(
            p.clone(),
            &Doc2MdError::FileNotFound { path: p.clone() },
        );
        assert!(matches!(input, FileError::Input { .. }));

        let conv = FileError::from_fatal(
            p.clone(),
            &Doc2MdError::EngineFailed {
                input: p.clone(),
                format: "gfm".into(),
                message: "boom".into(),
            },
        );
        assert!(matches!(conv, FileError::Conversion { .. }));
        assert!(conv.to_string().contains("boom"));
    }
}
