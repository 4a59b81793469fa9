//! # doc2md
//!
//! Convert office documents (DOCX, PPTX, anything pandoc reads) to Markdown,
//! with table repair on the way.
//!
//! ## Why this crate?
//!
//! A direct pandoc DOCX → Markdown conversion flattens complex tables:
//! merged cells vanish and hidden Word columns turn into phantom pipe-table
//! columns. Converting through HTML keeps the full cell structure, and a
//! small set of text-level rules removes the column debris before the
//! second hop.
//!
//! ## Pipeline Overview
//!
//! ```text
//! DOCX
//!  │
//!  ├─ 1. Input       check the path before pandoc sees it
//!  ├─ 2. HTML hop    pandoc --to html --standalone     (two-step only)
//!  ├─ 3. Validate    count tables, merged cells, column debris (advisory)
//!  ├─ 4. Preprocess  drop hidden columns, empty colgroups, inter-tag space
//!  ├─ 5. Target hop  pandoc --from html --to gfm
//!  └─ 6. Output      atomic write + per-file stats
//! ```
//!
//! The direct strategy skips steps 2–4 and makes a single hop.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2md::{convert_to_file, ConversionConfig, Strategy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .strategy(Strategy::TwoStep)
//!         .build()?;
//!     let output = convert_to_file("report.docx", "report.md", &config).await?;
//!     for change in &output.changes {
//!         eprintln!("{change}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! doc2md = { version = "0.3", default-features = false }
//! ```
//!
//! ## pandoc
//!
//! Every conversion is delegated to pandoc (≥ 2.0). It is found through
//! `PANDOC_PATH`, then `PATH`, then the usual install directories; see the
//! `pandoc-locate` crate. HTML validation and preprocessing work without it.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod advisor;
pub mod batch;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use advisor::{analyze, recommend, Analysis, Recommendation};
pub use batch::{convert_batch, expand_pattern, DEFAULT_PATTERN};
pub use config::{
    ConversionConfig, ConversionConfigBuilder, OutputFormat, Strategy, GRID_TABLES_FORMAT,
};
pub use convert::{
    convert, convert_direct, convert_sync, convert_to_file, convert_two_step,
    default_output_path, preprocess_file, step1, step2, validate_file, PreprocessFileOutput,
};
pub use engine::{resolve_engine, ConversionEngine, EngineRequest, Pandoc};
pub use error::{Doc2MdError, FileError};
pub use output::{BatchOutput, BatchStats, ConversionOutput, ConversionStats, FileResult};
pub use pipeline::preprocess::{preprocess, Preprocessed, TableChange};
pub use pipeline::validate::{table_stats, validate, TableStats, ValidationReport};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_batch_stream, FileResultStream};
