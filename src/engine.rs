//! The external conversion engine boundary.
//!
//! Every format conversion is delegated to pandoc. The library never looks
//! inside a DOCX or PPTX; it only hands pandoc a path and a target writer,
//! and takes back the text pandoc prints on stdout. A non-zero exit becomes
//! [`Doc2MdError::EngineFailed`] carrying pandoc's stderr verbatim.
//!
//! [`ConversionEngine`] is the seam: the pipeline talks to an
//! `Arc<dyn ConversionEngine>`, so tests and embedders can substitute their
//! own implementation.

use crate::config::ConversionConfig;
use crate::error::Doc2MdError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, warn};

/// One engine invocation.
#[derive(Debug, Clone)]
pub struct EngineRequest<'a> {
    /// Document to read.
    pub input: &'a Path,
    /// Reader name; `None` lets the engine infer it from the extension.
    pub from: Option<&'a str>,
    /// Writer name, e.g. `html`, `gfm`.
    pub to: &'a str,
    /// Produce a complete document rather than a fragment.
    pub standalone: bool,
    /// Additional engine arguments, appended last.
    pub extra_args: &'a [String],
}

impl<'a> EngineRequest<'a> {
    pub fn new(input: &'a Path, to: &'a str) -> Self {
        Self {
            input,
            from: None,
            to,
            standalone: false,
            extra_args: &[],
        }
    }

    pub fn from_format(mut self, from: &'a str) -> Self {
        self.from = Some(from);
        self
    }

    pub fn standalone(mut self, v: bool) -> Self {
        self.standalone = v;
        self
    }

    pub fn extra_args(mut self, args: &'a [String]) -> Self {
        self.extra_args = args;
        self
    }
}

/// Something that turns a document into text in another format.
#[async_trait]
pub trait ConversionEngine: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Convert `request.input` and return the converted text.
    async fn convert(&self, request: &EngineRequest<'_>) -> Result<String, Doc2MdError>;
}

/// pandoc invoked as a child process.
#[derive(Debug, Clone)]
pub struct Pandoc {
    program: PathBuf,
}

impl Pandoc {
    /// Use the pandoc executable at `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Locate pandoc via `PANDOC_PATH`, `PATH` and well-known directories.
    pub fn locate() -> Result<Self, Doc2MdError> {
        Ok(Self::new(pandoc_locate::locate_pandoc()?))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command-line arguments for `request`, excluding the program name.
    pub fn args(request: &EngineRequest<'_>) -> Vec<String> {
        let mut args = Vec::with_capacity(6 + request.extra_args.len());
        args.push(request.input.to_string_lossy().into_owned());
        if let Some(from) = request.from {
            args.push("--from".to_string());
            args.push(from.to_string());
        }
        args.push("--to".to_string());
        args.push(request.to.to_string());
        if request.standalone {
            args.push("--standalone".to_string());
        }
        args.extend(request.extra_args.iter().cloned());
        args
    }
}

#[async_trait]
impl ConversionEngine for Pandoc {
    fn name(&self) -> &str {
        "pandoc"
    }

    async fn convert(&self, request: &EngineRequest<'_>) -> Result<String, Doc2MdError> {
        let args = Self::args(request);
        debug!("{} {}", self.program.display(), args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Doc2MdError::EngineSpawnFailed {
                program: self.program.clone(),
                source: e,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            let message = if stderr.trim().is_empty() {
                format!("pandoc exited with {}", output.status)
            } else {
                stderr.trim().to_string()
            };
            return Err(Doc2MdError::EngineFailed {
                input: request.input.to_path_buf(),
                format: request.to.to_string(),
                message,
            });
        }
        if !stderr.trim().is_empty() {
            warn!("pandoc: {}", stderr.trim());
        }

        String::from_utf8(output.stdout).map_err(|e| Doc2MdError::EngineFailed {
            input: request.input.to_path_buf(),
            format: request.to.to_string(),
            message: format!("output is not valid UTF-8: {e}"),
        })
    }
}

/// Resolve the engine, from most-specific to least-specific:
///
/// 1. **Pre-built engine** (`config.engine`), used as-is.
/// 2. **Explicit executable** (`config.pandoc_path`).
/// 3. **Search** via `pandoc-locate`.
pub fn resolve_engine(config: &ConversionConfig) -> Result<Arc<dyn ConversionEngine>, Doc2MdError> {
    if let Some(ref engine) = config.engine {
        return Ok(Arc::clone(engine));
    }
    if let Some(ref path) = config.pandoc_path {
        if !path.is_file() {
            return Err(Doc2MdError::EngineNotFound(format!(
                "pandoc path '{}' does not exist",
                path.display()
            )));
        }
        return Ok(Arc::new(Pandoc::new(path)));
    }
    Ok(Arc::new(Pandoc::locate()?))
}
