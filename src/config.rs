//! Configuration types for document-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share a config across the files of a batch and to log the
//! exact settings a run used.

use crate::engine::ConversionEngine;
use crate::error::Doc2MdError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// pandoc writer spec for Markdown that only uses grid tables.
pub const GRID_TABLES_FORMAT: &str =
    "markdown+grid_tables-simple_tables-pipe_tables-multiline_tables";

/// Configuration for a conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use doc2md::{ConversionConfig, OutputFormat, Strategy};
///
/// let config = ConversionConfig::builder()
///     .strategy(Strategy::TwoStep)
///     .format(OutputFormat::Gfm)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Target format of the final hop. `None` picks the strategy's default:
    /// plain `markdown` for [`Strategy::Direct`], `gfm` for
    /// [`Strategy::TwoStep`].
    pub format: Option<OutputFormat>,

    /// Single hop, or source → HTML → target with table repair in between.
    /// Default: [`Strategy::Direct`].
    pub strategy: Strategy,

    /// Run the HTML table preprocessor between the two hops. Default: true.
    pub preprocess: bool,

    /// Validate the intermediate HTML and attach the report to the output.
    /// Default: true.
    pub validate_intermediate: bool,

    /// Extra engine arguments for the final hop. Default: `["--wrap=none"]`.
    ///
    /// Output redirection (`-o`, `--output`) is rejected by the builder: the
    /// library captures the engine's stdout and writes files itself.
    pub extra_args: Vec<String>,

    /// Persistent path for the intermediate HTML. When set, the file is kept
    /// after the conversion; otherwise a scoped temp file is used and removed.
    pub intermediate_path: Option<PathBuf>,

    /// Directory for scoped intermediate files. Default: the system temp dir.
    pub temp_dir: Option<PathBuf>,

    /// Explicit pandoc executable. If None, `pandoc-locate` searches for it.
    pub pandoc_path: Option<PathBuf>,

    /// Pre-constructed engine. Takes precedence over `pandoc_path`.
    pub engine: Option<Arc<dyn ConversionEngine>>,

    /// Files converted at once by the batch driver. Default: 1 (sequential).
    pub concurrency: usize,

    /// Optional batch progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            format: None,
            strategy: Strategy::default(),
            preprocess: true,
            validate_intermediate: true,
            extra_args: vec!["--wrap=none".to_string()],
            intermediate_path: None,
            temp_dir: None,
            pandoc_path: None,
            engine: None,
            concurrency: 1,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("format", &self.format)
            .field("strategy", &self.strategy)
            .field("preprocess", &self.preprocess)
            .field("validate_intermediate", &self.validate_intermediate)
            .field("extra_args", &self.extra_args)
            .field("intermediate_path", &self.intermediate_path)
            .field("temp_dir", &self.temp_dir)
            .field("pandoc_path", &self.pandoc_path)
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The format the final hop will produce.
    pub fn target_format(&self) -> OutputFormat {
        self.format.clone().unwrap_or(match self.strategy {
            Strategy::Direct => OutputFormat::Markdown,
            Strategy::TwoStep => OutputFormat::Gfm,
        })
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = Some(format);
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn two_step(self, v: bool) -> Self {
        self.strategy(if v {
            Strategy::TwoStep
        } else {
            Strategy::Direct
        })
    }

    pub fn preprocess(mut self, v: bool) -> Self {
        self.config.preprocess = v;
        self
    }

    pub fn validate_intermediate(mut self, v: bool) -> Self {
        self.config.validate_intermediate = v;
        self
    }

    pub fn extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn intermediate_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.intermediate_path = Some(path.into());
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    pub fn pandoc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pandoc_path = Some(path.into());
        self
    }

    pub fn engine(mut self, engine: Arc<dyn ConversionEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Doc2MdError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(Doc2MdError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if let Some(arg) = c.extra_args.iter().find(|a| is_output_flag(a)) {
            return Err(Doc2MdError::InvalidConfig(format!(
                "engine argument '{arg}' redirects output; pass an output path instead"
            )));
        }
        if c.intermediate_path.is_some() && c.strategy == Strategy::Direct {
            return Err(Doc2MdError::InvalidConfig(
                "an intermediate HTML path only applies to the two-step strategy".into(),
            ));
        }
        Ok(self.config)
    }
}

fn is_output_flag(arg: &str) -> bool {
    arg == "--output"
        || arg.starts_with("--output=")
        || (arg.starts_with("-o") && !arg.starts_with("--"))
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How a document reaches its target format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Strategy {
    /// One engine call, source → target. (default)
    #[default]
    Direct,
    /// Source → standalone HTML → (table repair) → target.
    ///
    /// Tables survive better because the HTML writer keeps the full cell
    /// structure that a direct Markdown write would flatten.
    TwoStep,
}

/// Output format requested from the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// pandoc Markdown. (default for the direct strategy)
    #[default]
    Markdown,
    /// GitHub-Flavored Markdown with pipe tables.
    Gfm,
    /// pandoc Markdown restricted to grid tables, which can express
    /// multi-line cells that pipe tables cannot.
    GridTables,
    /// HTML fragment or document.
    Html,
    /// Any other pandoc writer name, passed through verbatim.
    Other(String),
}

impl OutputFormat {
    /// The writer name handed to pandoc's `--to`.
    pub fn as_pandoc(&self) -> &str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Gfm => "gfm",
            OutputFormat::GridTables => GRID_TABLES_FORMAT,
            OutputFormat::Html => "html",
            OutputFormat::Other(s) => s,
        }
    }

    /// File extension for output written in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Other(s) if s.starts_with("html") => "html",
            _ => "md",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_pandoc())
    }
}

impl FromStr for OutputFormat {
    type Err = Doc2MdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Doc2MdError::InvalidConfig("output format is empty".into()));
        }
        Ok(match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => OutputFormat::Markdown,
            "gfm" => OutputFormat::Gfm,
            "grid" | "grid_tables" | "grid-tables" => OutputFormat::GridTables,
            "html" => OutputFormat::Html,
            _ if s == GRID_TABLES_FORMAT => OutputFormat::GridTables,
            _ => OutputFormat::Other(s.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.strategy, Strategy::Direct);
        assert!(c.preprocess);
        assert_eq!(c.extra_args, vec!["--wrap=none"]);
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.target_format(), OutputFormat::Markdown);
    }

    #[test]
    fn two_step_defaults_to_gfm() {
        let c = ConversionConfig::builder().two_step(true).build().unwrap();
        assert_eq!(c.target_format(), OutputFormat::Gfm);

        let c = ConversionConfig::builder()
            .two_step(true)
            .format(OutputFormat::GridTables)
            .build()
            .unwrap();
        assert_eq!(c.target_format().as_pandoc(), GRID_TABLES_FORMAT);
    }

    #[test]
    fn rejects_output_redirection() {
        for bad in ["-o", "--output", "--output=x.md", "-ofoo.md"] {
            let err = ConversionConfig::builder()
                .extra_args(["--wrap=none", bad])
                .build()
                .unwrap_err();
            assert!(matches!(err, Doc2MdError::InvalidConfig(_)), "{bad}");
        }
        assert!(ConversionConfig::builder()
            .extra_args(["--columns=120", "--toc"])
            .build()
            .is_ok());
    }

    #[test]
    fn intermediate_path_requires_two_step() {
        assert!(ConversionConfig::builder()
            .intermediate_path("keep.html")
            .build()
            .is_err());
        assert!(ConversionConfig::builder()
            .two_step(true)
            .intermediate_path("keep.html")
            .build()
            .is_ok());
    }

    #[test]
    fn concurrency_clamped() {
        let c = ConversionConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn format_parsing() {
        assert_eq!("GFM".parse::<OutputFormat>().unwrap(), OutputFormat::Gfm);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!(
            "grid".parse::<OutputFormat>().unwrap(),
            OutputFormat::GridTables
        );
        assert_eq!(
            GRID_TABLES_FORMAT.parse::<OutputFormat>().unwrap(),
            OutputFormat::GridTables
        );
        assert_eq!(
            "commonmark_x".parse::<OutputFormat>().unwrap(),
            OutputFormat::Other("commonmark_x".into())
        );
        assert!("  ".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn extensions() {
        assert_eq!(OutputFormat::Html.extension(), "html");
        assert_eq!(OutputFormat::Other("html5".into()).extension(), "html");
        assert_eq!(OutputFormat::Gfm.extension(), "md");
    }
}
