//! Streaming batch API: emit file results as they complete.
//!
//! [`crate::batch::convert_batch`] returns only after every file is done.
//! [`convert_batch_stream`] yields each [`FileResult`] as soon as its file
//! finishes, so callers can report or post-process files while the rest of
//! the batch is still running. With `concurrency > 1` results arrive in
//! completion order (sort by `input` if order matters).

use crate::batch::{batch_config, convert_one, expand_pattern, plan};
use crate::config::ConversionConfig;
use crate::error::Doc2MdError;
use crate::output::FileResult;
use futures::future;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::{info, warn};

/// A boxed stream of per-file results.
pub type FileResultStream = Pin<Box<dyn Stream<Item = FileResult> + Send>>;

/// Convert every file matching `pattern`, streaming results.
///
/// Progress callbacks fire exactly as for the eager driver;
/// `on_batch_complete` runs once the last result has been yielded.
///
/// # Returns
/// - `Ok(FileResultStream)`: one item per matched file, failures included
/// - `Err(Doc2MdError)`: the pattern could not be compiled
pub fn convert_batch_stream(
    pattern: &str,
    output_dir: Option<&Path>,
    config: &ConversionConfig,
) -> Result<FileResultStream, Doc2MdError> {
    let files = expand_pattern(pattern)?;
    let total = files.len();
    if total == 0 {
        warn!("No files match '{}'", pattern);
        return Ok(Box::pin(stream::empty()));
    }
    info!("Streaming conversion of {} file(s) matching '{}'", total, pattern);

    let config = Arc::new(batch_config(config));
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let concurrency = config.concurrency;
    let jobs = plan(files, output_dir, &config);
    let converted = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&converted);
    let job_config = Arc::clone(&config);
    let results = stream::iter(jobs)
        .map(move |(index, input, output)| {
            let cfg = Arc::clone(&job_config);
            async move { convert_one(input, output, index, total, &cfg).await }
        })
        .buffer_unordered(concurrency)
        .inspect(move |result| {
            if result.is_success() {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        });

    // Yields nothing; fires the summary callback after the last result.
    let finish = stream::once(async move {
        let converted = converted.load(Ordering::Relaxed);
        info!("Streamed batch done: {}/{} converted", converted, total);
        if let Some(ref cb) = config.progress_callback {
            cb.on_batch_complete(total, converted);
        }
        None::<FileResult>
    })
    .filter_map(future::ready);

    Ok(Box::pin(results.chain(finish)))
}
