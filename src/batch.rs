//! Batch conversion: every file matching a glob pattern.
//!
//! ## Failure model
//!
//! A pattern that does not compile is fatal. A file that fails to convert
//! is not: it becomes a [`FileResult`] with `error: Some(..)` and the batch
//! moves on. The caller decides what a partial batch means (the CLI exits
//! with status 1 when any file failed).

use crate::config::ConversionConfig;
use crate::convert::convert_to_file;
use crate::error::{Doc2MdError, FileError};
use crate::output::{BatchOutput, BatchStats, FileResult};
use crate::pipeline::input;
use futures::stream::{self, StreamExt};
use globset::{GlobBuilder, GlobMatcher};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Pattern used when the caller does not give one.
pub const DEFAULT_PATTERN: &str = "*.docx";

/// Expand a glob pattern into the sorted list of matching files.
///
/// The pattern is split at its first component containing a glob
/// metacharacter; the literal part before it is the directory that gets
/// walked. `*` and `?` never cross a `/`; `**` does.
///
/// A pattern with no metacharacters matches itself if it names a file.
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>, Doc2MdError> {
    let (base, rest) = split_pattern(pattern);

    let Some(rest) = rest else {
        let path = PathBuf::from(pattern);
        return Ok(if path.is_file() { vec![path] } else { Vec::new() });
    };

    let matcher = compile(pattern, &rest)?;
    let implicit_base = base.as_os_str().is_empty();
    let root = if implicit_base {
        PathBuf::from(".")
    } else {
        base.clone()
    };

    let mut walker = WalkDir::new(&root).min_depth(1).follow_links(true);
    if !rest.contains("**") {
        walker = walker.max_depth(rest.split('/').count());
    }

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let rel = entry.path().strip_prefix(&root).ok()?;
            let rel_display = rel.to_string_lossy().replace('\\', "/");
            if !matcher.is_match(&rel_display) {
                return None;
            }
            Some(if implicit_base {
                rel.to_path_buf()
            } else {
                entry.path().to_path_buf()
            })
        })
        .collect();

    files.sort();
    debug!("Pattern '{}' matched {} file(s)", pattern, files.len());
    Ok(files)
}

/// Convert every file matching `pattern`.
///
/// Each output is `<output_dir>/<stem>.<ext>`, or the input path with the
/// target extension when `output_dir` is `None`. Results come back in
/// input order whatever `config.concurrency` is.
///
/// # Errors
/// Only an invalid pattern is an error; per-file failures are reported in
/// [`BatchOutput::files`].
pub async fn convert_batch(
    pattern: &str,
    output_dir: Option<&Path>,
    config: &ConversionConfig,
) -> Result<BatchOutput, Doc2MdError> {
    let start = Instant::now();
    let files = expand_pattern(pattern)?;
    let total = files.len();

    if total == 0 {
        warn!("No files match '{}'", pattern);
        return Ok(BatchOutput::default());
    }
    info!("Converting {} file(s) matching '{}'", total, pattern);

    let config = batch_config(config);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let jobs = plan(files, output_dir, &config);
    let mut results: Vec<(usize, FileResult)> = stream::iter(jobs)
        .map(|(index, input, output)| {
            let config = &config;
            async move {
                let result = convert_one(input, output, index, total, config).await;
                (index, result)
            }
        })
        .buffer_unordered(config.concurrency)
        .collect()
        .await;
    results.sort_by_key(|(index, _)| *index);

    let files: Vec<FileResult> = results.into_iter().map(|(_, r)| r).collect();
    let converted = files.iter().filter(|f| f.is_success()).count();
    let stats = BatchStats {
        matched: total,
        converted,
        failed: total - converted,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, converted);
    }
    info!(
        "Batch complete: {}/{} converted in {}ms",
        converted, total, stats.total_duration_ms
    );

    Ok(BatchOutput { files, stats })
}

// ── Shared with the streaming driver ─────────────────────────────────────

/// The per-batch config: a persistent intermediate path would be shared
/// by every file, so batches always use scoped intermediates.
pub(crate) fn batch_config(config: &ConversionConfig) -> ConversionConfig {
    let mut config = config.clone();
    if let Some(path) = config.intermediate_path.take() {
        warn!(
            "Ignoring intermediate path {} for a batch; each file uses a temp file",
            path.display()
        );
    }
    config
}

/// Pair each input with its 1-based index and its output path.
pub(crate) fn plan(
    files: Vec<PathBuf>,
    output_dir: Option<&Path>,
    config: &ConversionConfig,
) -> Vec<(usize, PathBuf, PathBuf)> {
    let ext = config.target_format().extension();
    files
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            let output = match output_dir {
                Some(dir) => input::output_in_dir(&input, dir, ext),
                None => input::sibling_with_extension(&input, ext),
            };
            (i + 1, input, output)
        })
        .collect()
}

/// Convert one file of a batch, reporting progress and never failing.
pub(crate) async fn convert_one(
    input: PathBuf,
    output: PathBuf,
    index: usize,
    total: usize,
    config: &ConversionConfig,
) -> FileResult {
    let start = Instant::now();
    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_file_start(&input, index, total);
    }

    match convert_to_file(&input, &output, config).await {
        Ok(out) => {
            if let Some(cb) = cb {
                cb.on_file_complete(&input, &output, index, total);
            }
            FileResult {
                input,
                output,
                changes: out.changes,
                duration_ms: start.elapsed().as_millis() as u64,
                error: None,
            }
        }
        Err(e) => {
            warn!("[{}/{}] {} failed: {}", index, total, input.display(), e);
            if let Some(cb) = cb {
                cb.on_file_error(&input, index, total, &e.to_string());
            }
            FileResult {
                error: Some(FileError::from_fatal(input.clone(), &e)),
                input,
                output,
                changes: Vec::new(),
                duration_ms: start.elapsed().as_millis() as u64,
            }
        }
    }
}

// ── Pattern helpers ──────────────────────────────────────────────────────

fn has_meta(s: &str) -> bool {
    s.contains(['*', '?', '[', '{'])
}

/// Split `pattern` into its literal directory prefix and the glob part
/// relative to it (`None` when there is no glob part).
fn split_pattern(pattern: &str) -> (PathBuf, Option<String>) {
    let mut base = PathBuf::new();
    let mut rest: Vec<String> = Vec::new();

    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if rest.is_empty() && !has_meta(&text) {
            match component {
                Component::CurDir if base.as_os_str().is_empty() => {}
                _ => base.push(component),
            }
        } else {
            rest.push(text.into_owned());
        }
    }

    if rest.is_empty() {
        (base, None)
    } else {
        (base, Some(rest.join("/")))
    }
}

fn compile(pattern: &str, glob: &str) -> Result<GlobMatcher, Doc2MdError> {
    GlobBuilder::new(glob)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| Doc2MdError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.kind().to_string(),
        })
}
