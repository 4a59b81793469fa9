//! Strategy recommendations from the table structure of a document.
//!
//! [`analyze`] runs the HTML hop once, counts table constructs, and hands
//! the counts to [`recommend`]. The policy only ranks options; it never
//! changes what a conversion does. Callers pick a [`Recommendation`] and
//! build a [`ConversionConfig`] from it.

use crate::config::{ConversionConfig, OutputFormat, Strategy};
use crate::engine::{resolve_engine, EngineRequest};
use crate::error::Doc2MdError;
use crate::pipeline::input;
use crate::pipeline::validate::{table_stats, TableStats, ValidationReport};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Above this many merged cells (in either direction) the two-step path is
/// preferred.
pub const MERGED_CELL_THRESHOLD: usize = 5;

/// Above this many tables grid tables are offered as an alternative.
pub const TABLE_COUNT_THRESHOLD: usize = 5;

/// One ranked conversion option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub strategy: Strategy,
    pub format: OutputFormat,
    pub reason: String,
}

impl Recommendation {
    fn new(strategy: Strategy, format: OutputFormat, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            format,
            reason: reason.into(),
        }
    }

    /// A config that applies this recommendation on top of `base`.
    pub fn apply(&self, base: &ConversionConfig) -> ConversionConfig {
        let mut config = base.clone();
        config.strategy = self.strategy;
        config.format = Some(self.format.clone());
        if self.strategy == Strategy::Direct {
            config.intermediate_path = None;
        }
        config
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = match self.strategy {
            Strategy::Direct => "direct",
            Strategy::TwoStep => "two-step",
        };
        write!(f, "{method} → {}: {}", self.format, self.reason)
    }
}

/// Result of [`analyze`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub input: PathBuf,
    /// Raw counts; `None` when the document could not be analysed.
    pub stats: Option<TableStats>,
    pub report: Option<ValidationReport>,
    /// Best option first. Never empty.
    pub recommendations: Vec<Recommendation>,
    /// Why analysis failed, when it did.
    pub error: Option<String>,
}

/// Rank conversion options for a document with the given table counts.
pub fn recommend(stats: &TableStats, issues: &[String]) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    if stats.tables == 0 {
        recs.push(Recommendation::new(
            Strategy::Direct,
            OutputFormat::Markdown,
            "no tables, plain conversion is enough",
        ));
    } else if stats.colspan_cells > MERGED_CELL_THRESHOLD
        || stats.rowspan_cells > MERGED_CELL_THRESHOLD
    {
        recs.push(Recommendation::new(
            Strategy::TwoStep,
            OutputFormat::Gfm,
            format!(
                "{} colspan and {} rowspan cell(s), convert through HTML",
                stats.colspan_cells, stats.rowspan_cells
            ),
        ));
        recs.push(Recommendation::new(
            Strategy::Direct,
            OutputFormat::GridTables,
            "grid tables handle complex tables better",
        ));
    } else if stats.tables > TABLE_COUNT_THRESHOLD {
        recs.push(Recommendation::new(
            Strategy::Direct,
            OutputFormat::Gfm,
            format!("{} tables, GFM pipe tables handle them well", stats.tables),
        ));
        recs.push(Recommendation::new(
            Strategy::Direct,
            OutputFormat::GridTables,
            "many tables, grid tables are more stable",
        ));
    } else {
        recs.push(Recommendation::new(
            Strategy::Direct,
            OutputFormat::Gfm,
            "simple tables, GFM is recommended",
        ));
    }

    if !issues.is_empty() {
        recs.insert(
            0,
            Recommendation::new(
                Strategy::TwoStep,
                OutputFormat::Gfm,
                format!("issues found: {}", issues.join(", ")),
            ),
        );
    }

    recs
}

/// Options offered when a document cannot be analysed.
pub fn fallback_recommendations() -> Vec<Recommendation> {
    vec![
        Recommendation::new(
            Strategy::Direct,
            OutputFormat::Markdown,
            "analysis unavailable, using the default method",
        ),
        Recommendation::new(
            Strategy::Direct,
            OutputFormat::Gfm,
            "GFM handles tables well",
        ),
    ]
}

/// Convert `input` to HTML, inspect its tables, and recommend a strategy.
///
/// Never fails: when the document cannot be analysed the result carries
/// [`fallback_recommendations`] and the reason in [`Analysis::error`].
pub async fn analyze(input_path: impl AsRef<Path>, config: &ConversionConfig) -> Analysis {
    let input_path = input_path.as_ref();
    match inspect(input_path, config).await {
        Ok((stats, report)) => {
            let recommendations = recommend(&stats, &report.issues);
            info!(
                "{}: {} table(s), {} recommendation(s)",
                input_path.display(),
                stats.tables,
                recommendations.len()
            );
            Analysis {
                input: input_path.to_path_buf(),
                stats: Some(stats),
                report: Some(report),
                recommendations,
                error: None,
            }
        }
        Err(e) => {
            warn!("Could not analyse {}: {}", input_path.display(), e);
            Analysis {
                input: input_path.to_path_buf(),
                stats: None,
                report: None,
                recommendations: fallback_recommendations(),
                error: Some(e.to_string()),
            }
        }
    }
}

async fn inspect(
    input_path: &Path,
    config: &ConversionConfig,
) -> Result<(TableStats, ValidationReport), Doc2MdError> {
    let input = input::resolve_input(input_path)?;
    let engine = resolve_engine(config)?;
    let html = engine
        .convert(&EngineRequest::new(&input, "html").standalone(true))
        .await?;
    let stats = table_stats(&html);
    Ok((stats, ValidationReport::from(&stats)))
}
