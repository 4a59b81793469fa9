//! Conversion entry points for a single document.
//!
//! ## Direct vs. two-step
//!
//! A direct conversion is one engine call. The two-step path asks pandoc
//! for standalone HTML first, repairs the table markup with
//! [`crate::pipeline::preprocess`], and only then converts the HTML to the
//! target format. The intermediate HTML lives in a scoped temp file that is
//! removed on every exit path, success or failure.

use crate::config::{ConversionConfig, OutputFormat, Strategy};
use crate::engine::{resolve_engine, ConversionEngine, EngineRequest};
use crate::error::Doc2MdError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::preprocess::{preprocess, Preprocessed, TableChange};
use crate::pipeline::validate::{validate, ValidationReport};
use crate::pipeline::input;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempPath;
use tracing::{debug, info, warn};

/// Convert a document with the configured strategy and return the text.
///
/// # Errors
/// - input not found / unreadable
/// - engine missing, or the engine rejected the document (its diagnostic
///   is carried verbatim in [`Doc2MdError::EngineFailed`])
/// - the intermediate HTML could not be written (two-step only)
pub async fn convert(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2MdError> {
    match config.strategy {
        Strategy::Direct => convert_direct(input_path, config).await,
        Strategy::TwoStep => convert_two_step(input_path, config).await,
    }
}

/// Single hop: source → target format.
pub async fn convert_direct(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2MdError> {
    let total_start = Instant::now();
    let input = input::resolve_input(input_path)?;
    let engine = resolve_engine(config)?;
    let target = config.target_format();
    info!("Converting {} → {}", input.display(), target);

    let request = EngineRequest::new(&input, target.as_pandoc()).extra_args(&config.extra_args);
    let text = engine.convert(&request).await?;
    let elapsed = total_start.elapsed().as_millis() as u64;

    Ok(ConversionOutput {
        text,
        output_path: None,
        format: target.as_pandoc().to_string(),
        strategy: Strategy::Direct,
        changes: Vec::new(),
        validation: None,
        intermediate_path: None,
        stats: ConversionStats {
            total_duration_ms: elapsed,
            html_hop_ms: 0,
            target_hop_ms: elapsed,
        },
    })
}

/// Two hops: source → HTML → (table repair) → target format.
pub async fn convert_two_step(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2MdError> {
    let total_start = Instant::now();
    let input = input::resolve_input(input_path)?;
    let engine = resolve_engine(config)?;
    let target = config.target_format();
    info!("Two-step conversion {} → html → {}", input.display(), target);

    // ── Step 0: Reserve the intermediate file ────────────────────────────
    let intermediate = Intermediate::create(config).await?;

    // ── Step 1: Source → HTML (+ validate, + preprocess) ─────────────────
    let hop = html_hop(engine.as_ref(), &input, config).await?;
    intermediate.write(&hop.html).await?;

    // ── Step 2: HTML → target ────────────────────────────────────────────
    let target_start = Instant::now();
    let request = EngineRequest::new(intermediate.path(), target.as_pandoc())
        .from_format("html")
        .extra_args(&config.extra_args);
    let text = engine.convert(&request).await?;
    let target_hop_ms = target_start.elapsed().as_millis() as u64;

    let intermediate_path = intermediate.persistent_path();
    drop(intermediate);

    let total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Two-step conversion complete: {} change(s), {}ms total",
        hop.changes.len(),
        total_duration_ms
    );

    Ok(ConversionOutput {
        text,
        output_path: None,
        format: target.as_pandoc().to_string(),
        strategy: Strategy::TwoStep,
        changes: hop.changes,
        validation: hop.validation,
        intermediate_path,
        stats: ConversionStats {
            total_duration_ms,
            html_hop_ms: hop.duration_ms,
            target_hop_ms,
        },
    })
}

/// Convert a document and write the text to `output_path`.
///
/// Uses atomic write (temp file + rename): if any step fails, no output
/// file is created.
pub async fn convert_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2MdError> {
    let mut output = convert(input_path, config).await?;
    let path = output_path.as_ref();
    write_atomic(path, &output.text).await?;
    info!("Wrote {}", path.display());
    output.output_path = Some(path.to_path_buf());
    Ok(output)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Doc2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_path, config))
}

/// Manual first hop: source → HTML file (default `<input>.html`).
///
/// Runs the same validation and preprocessing as the automatic two-step
/// path, so `step1` followed by [`step2`] reproduces it.
pub async fn step1(
    input_path: impl AsRef<Path>,
    output_path: Option<&Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2MdError> {
    let total_start = Instant::now();
    let input = input::resolve_input(input_path)?;
    let engine = resolve_engine(config)?;
    let output_path = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input::sibling_with_extension(&input, "html"));

    let hop = html_hop(engine.as_ref(), &input, config).await?;
    write_atomic(&output_path, &hop.html).await?;
    info!("Step 1 wrote {}", output_path.display());

    Ok(ConversionOutput {
        text: hop.html,
        output_path: Some(output_path),
        format: "html".to_string(),
        strategy: Strategy::TwoStep,
        changes: hop.changes,
        validation: hop.validation,
        intermediate_path: None,
        stats: ConversionStats {
            total_duration_ms: total_start.elapsed().as_millis() as u64,
            html_hop_ms: hop.duration_ms,
            target_hop_ms: 0,
        },
    })
}

/// Manual second hop: HTML file → target (`<input>.md` by default).
///
/// Without an explicit format the target is `gfm`, not plain `markdown`.
pub async fn step2(
    html_path: impl AsRef<Path>,
    output_path: Option<&Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2MdError> {
    let total_start = Instant::now();
    let input = input::resolve_input(html_path)?;
    let engine = resolve_engine(config)?;
    let target = config.format.clone().unwrap_or(OutputFormat::Gfm);
    let output_path = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input::sibling_with_extension(&input, target.extension()));

    let request = EngineRequest::new(&input, target.as_pandoc())
        .from_format("html")
        .extra_args(&config.extra_args);
    let text = engine.convert(&request).await?;
    write_atomic(&output_path, &text).await?;
    info!("Step 2 wrote {}", output_path.display());

    let elapsed = total_start.elapsed().as_millis() as u64;
    Ok(ConversionOutput {
        text,
        output_path: Some(output_path),
        format: target.as_pandoc().to_string(),
        strategy: Strategy::TwoStep,
        changes: Vec::new(),
        validation: None,
        intermediate_path: None,
        stats: ConversionStats {
            total_duration_ms: elapsed,
            html_hop_ms: 0,
            target_hop_ms: elapsed,
        },
    })
}

/// Output of [`preprocess_file`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessFileOutput {
    /// Validation of the file as it was read.
    pub validation: ValidationReport,
    pub result: Preprocessed,
    pub output_path: PathBuf,
}

/// Validate and preprocess an HTML file, writing the result to
/// `output_path` or back over the input when `None`.
///
/// Does not need the conversion engine.
pub async fn preprocess_file(
    html_path: impl AsRef<Path>,
    output_path: Option<&Path>,
) -> Result<PreprocessFileOutput, Doc2MdError> {
    let input = input::resolve_input(html_path)?;
    let markup = input::read_markup(&input)?;
    let validation = validate(&markup);
    let result = preprocess(&markup);
    for change in &result.changes {
        info!("{}: {}", input.display(), change);
    }

    let output_path = output_path.map(Path::to_path_buf).unwrap_or(input);
    write_atomic(&output_path, &result.html).await?;

    Ok(PreprocessFileOutput {
        validation,
        result,
        output_path,
    })
}

/// Validate the tables of an HTML file without modifying it.
pub fn validate_file(html_path: impl AsRef<Path>) -> Result<ValidationReport, Doc2MdError> {
    let input = input::resolve_input(html_path)?;
    let markup = input::read_markup(&input)?;
    Ok(validate(&markup))
}

/// Default output path for `input` under `config`: the input with the
/// target format's extension.
pub fn default_output_path(input: &Path, config: &ConversionConfig) -> PathBuf {
    input::sibling_with_extension(input, config.target_format().extension())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Result of the source → HTML hop.
struct HtmlHop {
    html: String,
    changes: Vec<TableChange>,
    validation: Option<ValidationReport>,
    duration_ms: u64,
}

/// Ask the engine for standalone HTML, validate it, then preprocess it.
async fn html_hop(
    engine: &dyn ConversionEngine,
    input: &Path,
    config: &ConversionConfig,
) -> Result<HtmlHop, Doc2MdError> {
    let start = Instant::now();
    let request = EngineRequest::new(input, "html").standalone(true);
    let html = engine.convert(&request).await?;
    let duration_ms = start.elapsed().as_millis() as u64;
    debug!("HTML hop produced {} bytes in {}ms", html.len(), duration_ms);

    let validation = config.validate_intermediate.then(|| {
        let report = validate(&html);
        for issue in &report.issues {
            info!("{}: {}", input.display(), issue);
        }
        for warning in &report.warnings {
            debug!("{}: {}", input.display(), warning);
        }
        report
    });

    if !config.preprocess {
        return Ok(HtmlHop {
            html,
            changes: Vec::new(),
            validation,
            duration_ms,
        });
    }

    let Preprocessed { html, changes } = preprocess(&html);
    for change in &changes {
        debug!("{}: {}", input.display(), change);
    }
    Ok(HtmlHop {
        html,
        changes,
        validation,
        duration_ms,
    })
}

/// The HTML file between the two hops.
///
/// Scoped files are removed when this value is dropped, whichever way the
/// conversion exits. A removal failure is logged, never returned.
struct Intermediate {
    path: PathBuf,
    scoped: Option<TempPath>,
}

impl Intermediate {
    async fn create(config: &ConversionConfig) -> Result<Self, Doc2MdError> {
        if let Some(ref path) = config.intermediate_path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    Doc2MdError::IntermediateWriteFailed {
                        path: path.clone(),
                        source: e,
                    }
                })?;
            }
            return Ok(Self {
                path: path.clone(),
                scoped: None,
            });
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("doc2md-").suffix(".html");
        let created = match config.temp_dir {
            Some(ref dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        let temp = created
            .map_err(|e| Doc2MdError::IntermediateWriteFailed {
                path: config.temp_dir.clone().unwrap_or_else(std::env::temp_dir),
                source: e,
            })?
            .into_temp_path();
        debug!("Intermediate HTML: {}", temp.display());

        Ok(Self {
            path: temp.to_path_buf(),
            scoped: Some(temp),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn persistent_path(&self) -> Option<PathBuf> {
        self.scoped.is_none().then(|| self.path.clone())
    }

    async fn write(&self, html: &str) -> Result<(), Doc2MdError> {
        tokio::fs::write(&self.path, html)
            .await
            .map_err(|e| Doc2MdError::IntermediateWriteFailed {
                path: self.path.clone(),
                source: e,
            })
    }
}

impl Drop for Intermediate {
    fn drop(&mut self) {
        if let Some(temp) = self.scoped.take() {
            match temp.close() {
                Ok(()) => debug!("Removed intermediate HTML {}", self.path.display()),
                Err(e) => warn!(
                    "Failed to remove intermediate HTML {}: {}",
                    self.path.display(),
                    e
                ),
            }
        }
    }
}

/// Write `contents` to `path` via a sibling temp file and a rename,
/// creating parent directories as needed.
async fn write_atomic(path: &Path, contents: &str) -> Result<(), Doc2MdError> {
    let write_err = |e| Doc2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "output".into());
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    if let Err(e) = tokio::fs::write(&tmp_path, contents).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}
