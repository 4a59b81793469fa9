//! HTML table preprocessing: text-level repair of engine-generated HTML.
//!
//! ## Why repair the HTML at all?
//!
//! Word documents carry column metadata that survives into pandoc's HTML as
//! `<colgroup>`/`<col>` declarations. Hidden or zero-width columns and the
//! empty groups they leave behind make the HTML→Markdown hop emit phantom
//! columns, so the pipe table ends up wider than the data. Whitespace text
//! nodes between tags cause similar drift in cell alignment.
//!
//! The markup is treated as text, never as a tree. Each rule is a regex pass
//! that either matches and records a [`TableChange`], or does nothing.
//!
//! ## Rule Order
//!
//! 1. Remove `<col>` declarations hidden by `width: 0%` / `display: none`
//! 2. Remove `<colgroup>` elements that are (now) empty
//! 3. Remove whitespace runs between `>` and `<`
//! 4. Prepend a provenance marker comment
//!
//! Rule 2 runs after rule 1 and re-checks emptiness, so a group emptied by
//! rule 1 is removed in the same pass.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of the marker line prepended to every preprocessed document.
pub const MARKER_PREFIX: &str = "<!-- HTML preprocessing: ";

const NO_CHANGES: &str = "no changes needed";

/// One rule that fired during a preprocessing pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableChange {
    /// `<col>` declarations hidden by their inline style.
    RemovedEmptyColumns(usize),
    /// `<colgroup>` elements with nothing but whitespace inside.
    RemovedEmptyColgroups(usize),
    /// Whitespace between tags was collapsed.
    NormalizedWhitespace,
}

impl fmt::Display for TableChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableChange::RemovedEmptyColumns(n) => write!(f, "removed {n} empty column(s)"),
            TableChange::RemovedEmptyColgroups(n) => {
                write!(f, "removed {n} empty colgroup tag(s)")
            }
            TableChange::NormalizedWhitespace => f.write_str("normalized whitespace between tags"),
        }
    }
}

/// Result of one preprocessing pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preprocessed {
    /// Repaired markup, starting with the provenance marker line.
    pub html: String,
    /// Rules that fired, in evaluation order.
    pub changes: Vec<TableChange>,
}

impl Preprocessed {
    /// Human-readable change log, one line per fired rule.
    pub fn change_log(&self) -> Vec<String> {
        self.changes.iter().map(ToString::to_string).collect()
    }

    /// Whether any rule fired.
    pub fn is_unchanged(&self) -> bool {
        self.changes.is_empty()
    }
}

// ── Shared patterns ──────────────────────────────────────────────────────────
//
// The validator counts the same constructs the preprocessor removes, so the
// patterns live here and are re-used there.

/// `<col ...>` (not `<colgroup>`) whose style hides the column.
pub(crate) static RE_HIDDEN_COL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)<col\b[^>]*\bstyle\s*=\s*["'][^"']*(?:width\s*:\s*0%|display\s*:\s*none)[^"']*["'][^>]*/?>"#,
    )
    .unwrap()
});

/// `<col ...>` whose style sets a zero width.
pub(crate) static RE_ZERO_WIDTH_COL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<col\b[^>]*\bstyle\s*=\s*["'][^"']*width\s*:\s*0%[^"']*["'][^>]*/?>"#)
        .unwrap()
});

/// `<colgroup ...>` with only whitespace before its closing tag.
pub(crate) static RE_EMPTY_COLGROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<colgroup\b[^>]*>\s*</colgroup\s*>").unwrap());

static RE_INTER_TAG_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r">\s+<").unwrap());

// ── Pipeline ─────────────────────────────────────────────────────────────────

/// Apply all table-repair rules to `markup`.
///
/// Never fails: markup the patterns do not recognise passes through
/// untouched. A marker left by an earlier pass is dropped first so that
/// preprocessing its own output reports no changes.
pub fn preprocess(markup: &str) -> Preprocessed {
    let body = strip_marker(markup);
    let mut changes = Vec::new();

    let (body, removed) = remove_hidden_columns(body);
    if removed > 0 {
        changes.push(TableChange::RemovedEmptyColumns(removed));
    }

    let (body, removed) = remove_empty_colgroups(&body);
    if removed > 0 {
        changes.push(TableChange::RemovedEmptyColgroups(removed));
    }

    let (body, normalized) = normalize_whitespace(&body);
    if normalized {
        changes.push(TableChange::NormalizedWhitespace);
    }

    let mut html = marker_line(&changes);
    html.push_str(&body);
    Preprocessed { html, changes }
}

// ── Rule 1: Hidden columns ───────────────────────────────────────────────────

fn remove_hidden_columns(input: &str) -> (String, usize) {
    let count = RE_HIDDEN_COL.find_iter(input).count();
    if count == 0 {
        return (input.to_string(), 0);
    }
    (RE_HIDDEN_COL.replace_all(input, "").into_owned(), count)
}

// ── Rule 2: Empty column groups ──────────────────────────────────────────────

/// Repeats until nothing matches: removing an inner group can leave its
/// parent empty.
fn remove_empty_colgroups(input: &str) -> (String, usize) {
    let mut out = input.to_string();
    let mut total = 0;
    loop {
        let count = RE_EMPTY_COLGROUP.find_iter(&out).count();
        if count == 0 {
            return (out, total);
        }
        out = RE_EMPTY_COLGROUP.replace_all(&out, "").into_owned();
        total += count;
    }
}

// ── Rule 3: Inter-tag whitespace ─────────────────────────────────────────────

fn normalize_whitespace(input: &str) -> (String, bool) {
    let out = RE_INTER_TAG_WS.replace_all(input, "><").into_owned();
    let changed = out.len() != input.len();
    (out, changed)
}

// ── Rule 4: Provenance marker ────────────────────────────────────────────────

fn marker_line(changes: &[TableChange]) -> String {
    let summary = if changes.is_empty() {
        NO_CHANGES.to_string()
    } else {
        changes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!("{MARKER_PREFIX}{summary} -->\n")
}

/// Drop a marker line written by an earlier pass, if the input starts with one.
fn strip_marker(input: &str) -> &str {
    if !input.starts_with(MARKER_PREFIX) {
        return input;
    }
    match input.find("-->") {
        Some(end) => {
            let rest = &input[end + 3..];
            rest.strip_prefix("\r\n")
                .or_else(|| rest.strip_prefix('\n'))
                .unwrap_or(rest)
        }
        None => input,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
