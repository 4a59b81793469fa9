//! Table structure validation: advisory checks over HTML, no modification.
//!
//! The validator distinguishes two severities:
//!
//! - **issues** are structural defects that should be fixed before
//!   conversion (empty column groups, zero-width columns). The preprocessor
//!   removes exactly these.
//! - **warnings** flag constructs the Markdown writers may mishandle but
//!   which are not wrong in themselves (merged cells via `colspan` /
//!   `rowspan`).
//!
//! Counting is purely lexical: every `<table` opening tag counts as one
//! table, nesting and closing tags are not verified.

use crate::pipeline::preprocess::{RE_EMPTY_COLGROUP, RE_ZERO_WIDTH_COL};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static RE_TABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<table\b[^>]*>").unwrap());

static RE_COLSPAN_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<t[dh]\b[^>]*\scolspan\s*=\s*["']?\d+["']?[^>]*>"#).unwrap()
});

static RE_ROWSPAN_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<t[dh]\b[^>]*\srowspan\s*=\s*["']?\d+["']?[^>]*>"#).unwrap()
});

/// Raw counts of every construct the validator looks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    /// `<table` opening tags.
    pub tables: usize,
    /// Cells carrying a `colspan` attribute.
    pub colspan_cells: usize,
    /// Cells carrying a `rowspan` attribute.
    pub rowspan_cells: usize,
    /// `<colgroup>` elements with only whitespace inside.
    pub empty_colgroups: usize,
    /// `<col>` declarations with `width: 0%`.
    pub zero_width_cols: usize,
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Number of `<table` opening tags.
    pub table_count: usize,
    /// Structural defects.
    pub issues: Vec<String>,
    /// Risk indicators that are not defects.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// No issues and no warnings.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.warnings.is_empty()
    }
}

impl From<&TableStats> for ValidationReport {
    fn from(stats: &TableStats) -> Self {
        let mut warnings = Vec::new();
        if stats.colspan_cells > 0 {
            warnings.push(format!(
                "detected {} merged cell(s) (colspan)",
                stats.colspan_cells
            ));
        }
        if stats.rowspan_cells > 0 {
            warnings.push(format!(
                "detected {} merged cell(s) (rowspan)",
                stats.rowspan_cells
            ));
        }

        let mut issues = Vec::new();
        if stats.empty_colgroups > 0 {
            issues.push(format!(
                "detected {} empty colgroup tag(s)",
                stats.empty_colgroups
            ));
        }
        if stats.zero_width_cols > 0 {
            issues.push(format!(
                "detected {} zero-width column(s)",
                stats.zero_width_cols
            ));
        }

        Self {
            table_count: stats.tables,
            issues,
            warnings,
        }
    }
}

/// Count tables, merged cells and defective column declarations.
pub fn table_stats(markup: &str) -> TableStats {
    TableStats {
        tables: RE_TABLE.find_iter(markup).count(),
        colspan_cells: RE_COLSPAN_CELL.find_iter(markup).count(),
        rowspan_cells: RE_ROWSPAN_CELL.find_iter(markup).count(),
        empty_colgroups: RE_EMPTY_COLGROUP.find_iter(markup).count(),
        zero_width_cols: RE_ZERO_WIDTH_COL.find_iter(markup).count(),
    }
}

/// Check `markup` for table constructs known to break Markdown conversion.
pub fn validate(markup: &str) -> ValidationReport {
    ValidationReport::from(&table_stats(markup))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_tables_case_insensitively() {
        let html = r#"<table><tr><td>a</td></tr></table><TABLE class="x"></TABLE><Table
 id="t3"></table>"#;
        assert_eq!(validate(html).table_count, 3);
    }

    #[test]
    fn tbody_and_tablet_are_not_tables() {
        let html = "<table><tbody></tbody></table><tablet>";
        assert_eq!(table_stats(html).tables, 1);
    }

    #[test]
    fn merged_cells_are_warnings_not_issues() {
        let html = r#"<table>
<tr><td colspan="2">a</td><th COLSPAN='3'>b</th><td colspan="2" rowspan="2">c</td></tr>
<tr><td rowspan="4">d</td></tr>
</table>"#;
        let report = validate(html);
        assert!(report.issues.is_empty());
        assert_eq!(
            report.warnings,
            vec![
                "detected 3 merged cell(s) (colspan)".to_string(),
                "detected 2 merged cell(s) (rowspan)".to_string(),
            ]
        );
    }

    #[test]
    fn prefixed_span_attributes_are_not_merges() {
        let html = r#"<table><tr>
<td data-colspan="2">a</td><td aria-rowspan="3">b</td><th
colspan="2">c</th></tr></table>"#;
        let stats = table_stats(html);
        assert_eq!(stats.colspan_cells, 1);
        assert_eq!(stats.rowspan_cells, 0);
        assert_eq!(
            validate(html).warnings,
            vec!["detected 1 merged cell(s) (colspan)".to_string()]
        );
    }

    #[test]
    fn reference_example() {
        let html = r#"<colgroup></colgroup><table><tr><td colspan="2">a</td></tr></table>"#;
        let report = validate(html);
        assert_eq!(report.table_count, 1);
        assert_eq!(report.issues, vec!["detected 1 empty colgroup tag(s)"]);
        assert_eq!(report.warnings, vec!["detected 1 merged cell(s) (colspan)"]);
    }

    #[test]
    fn zero_width_is_an_issue_but_display_none_is_not() {
        let html = r#"<colgroup><col style="width: 0%"><col style="display:none"></colgroup>"#;
        let stats = table_stats(html);
        assert_eq!(stats.zero_width_cols, 1);
        assert_eq!(stats.empty_colgroups, 0);
        assert_eq!(
            validate(html).issues,
            vec!["detected 1 zero-width column(s)".to_string()]
        );
    }

    #[test]
    fn clean_document() {
        let report = validate("<p>No tables here.</p>");
        assert_eq!(report.table_count, 0);
        assert!(report.is_clean());
    }

    #[test]
    fn validation_does_not_see_removed_defects() {
        let html = r#"<table><colgroup><col style="width:0%"></colgroup><tr><td>x</td></tr></table>"#;
        assert!(!validate(html).issues.is_empty());
        let cleaned = crate::pipeline::preprocess::preprocess(html);
        assert!(validate(&cleaned.html).issues.is_empty());
    }
}
