//! End-to-end integration tests for doc2md.
//!
//! The first half exercises the public library surface with an in-memory
//! engine and runs everywhere. The second half drives a real pandoc; those
//! tests skip themselves when no pandoc executable can be found.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture
//!
//! To point at a specific pandoc:
//!   PANDOC_PATH=/opt/pandoc/bin/pandoc cargo test --test e2e

use async_trait::async_trait;
use doc2md::{
    analyze, convert, convert_batch, convert_to_file, preprocess, preprocess_file, step1, step2,
    table_stats, validate, ConversionConfig, ConversionEngine, Doc2MdError, EngineRequest,
    OutputFormat, Strategy, TableChange,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Returns fixed HTML for the HTML hop; for any other hop returns the file
/// it was handed, prefixed with the writer name.
struct FixedHtmlEngine(String);

#[async_trait]
impl ConversionEngine for FixedHtmlEngine {
    fn name(&self) -> &str {
        "fixed-html"
    }

    async fn convert(&self, request: &EngineRequest<'_>) -> Result<String, Doc2MdError> {
        if request.to == "html" {
            return Ok(self.0.clone());
        }
        let body = tokio::fs::read_to_string(request.input)
            .await
            .unwrap_or_default();
        Ok(format!("<{}>{}", request.to, body))
    }
}

fn fixed_engine(html: &str) -> Arc<dyn ConversionEngine> {
    Arc::new(FixedHtmlEngine(html.to_string()))
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

const REFERENCE: &str = r#"<colgroup></colgroup><table><tr><td colspan="2">a</td></tr></table>"#;

// ── Library properties ───────────────────────────────────────────────────────

#[test]
fn reference_example() {
    let report = validate(REFERENCE);
    assert_eq!(report.table_count, 1);
    assert_eq!(report.issues, vec!["detected 1 empty colgroup tag(s)"]);
    assert_eq!(report.warnings, vec!["detected 1 merged cell(s) (colspan)"]);

    let out = preprocess(REFERENCE);
    assert_eq!(out.changes, vec![TableChange::RemovedEmptyColgroups(1)]);
    assert!(out.html.ends_with(r#"<table><tr><td colspan="2">a</td></tr></table>"#));
}

#[test]
fn zero_width_columns_removed_in_any_case() {
    for decl in [
        r#"<col style="width: 0%">"#,
        r#"<COL STYLE="WIDTH:0%"/>"#,
        r#"<col span="2" style="color: red; width:   0%;" />"#,
    ] {
        let markup = format!("<table><colgroup>{decl}<col style=\"width: 50%\"></colgroup></table>");
        let out = preprocess(&markup);
        assert!(!out.html.contains(decl), "{decl} survived: {}", out.html);
        assert!(out.html.contains(r#"<col style="width: 50%">"#));
        assert_eq!(out.changes[0], TableChange::RemovedEmptyColumns(1));
    }
}

#[test]
fn untouched_markup_only_gains_marker() {
    let markup = "<p>no tables here</p>";
    let out = preprocess(markup);
    assert!(out.changes.is_empty());
    assert_eq!(
        out.html,
        "<!-- HTML preprocessing: no changes needed -->\n<p>no tables here</p>"
    );
}

#[test]
fn preprocessing_is_idempotent() {
    let markup = "<table>\n  <colgroup>\n    <col style=\"display:none\">\n  </colgroup>\n  <tr> <td>x</td> </tr>\n</table>";
    let first = preprocess(markup);
    assert_eq!(first.changes.len(), 3);

    let second = preprocess(&first.html);
    assert!(second.changes.is_empty(), "got {:?}", second.changes);
    assert_eq!(
        second.html.lines().skip(1).collect::<Vec<_>>(),
        first.html.lines().skip(1).collect::<Vec<_>>()
    );
}

#[test]
fn table_count_matches_opening_tags() {
    let markup = "<TABLE class=a></TABLE><table></table><Table\nid=x></Table><tbody></tbody>";
    assert_eq!(validate(markup).table_count, 3);
    assert_eq!(table_stats(markup).tables, 3);
}

#[test]
fn merged_cells_are_warnings_only() {
    let markup = r#"<table>
<tr><td colspan="2">a</td><td colspan="3">b</td><th colspan=2>c</th></tr>
<tr><td rowspan="2">d</td><td rowspan="2">e</td></tr>
</table>"#;
    let report = validate(markup);
    assert!(report.issues.is_empty());
    assert_eq!(
        report.warnings,
        vec![
            "detected 3 merged cell(s) (colspan)",
            "detected 2 merged cell(s) (rowspan)",
        ]
    );
}

#[tokio::test]
async fn two_step_writes_repaired_html_through_second_hop() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = dir.path().join("tmp");
    std::fs::create_dir(&scratch).unwrap();
    let input = write_file(dir.path(), "report.docx", "PK");
    let config = ConversionConfig::builder()
        .two_step(true)
        .engine(fixed_engine(REFERENCE))
        .temp_dir(&scratch)
        .build()
        .unwrap();

    let out_path = dir.path().join("report.md");
    let out = convert_to_file(&input, &out_path, &config).await.unwrap();

    let written = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(written, out.text);
    assert!(written.starts_with("<gfm><!-- HTML preprocessing: removed 1 empty colgroup tag(s) -->"));
    assert!(!written.contains("<colgroup>"));
    assert_eq!(out.strategy, Strategy::TwoStep);
    assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
}

#[tokio::test]
async fn failed_intermediate_write_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "report.docx", "PK");
    // The intermediate path is a directory, so writing the HTML fails.
    let blocked = dir.path().join("keep.html");
    std::fs::create_dir(&blocked).unwrap();
    let config = ConversionConfig::builder()
        .two_step(true)
        .engine(fixed_engine(REFERENCE))
        .intermediate_path(&blocked)
        .build()
        .unwrap();

    let out_path = dir.path().join("report.md");
    let err = convert_to_file(&input, &out_path, &config).await.unwrap_err();
    assert!(matches!(err, Doc2MdError::IntermediateWriteFailed { .. }));
    assert!(!out_path.exists());
    assert!(!dir.path().join("report.md.tmp").exists());
}

#[tokio::test]
async fn preprocess_file_writes_new_file() {
    let dir = tempfile::tempdir().unwrap();
    let html = write_file(dir.path(), "page.html", REFERENCE);
    let target = dir.path().join("clean").join("page.html");

    let out = preprocess_file(&html, Some(&target)).await.unwrap();
    assert_eq!(out.output_path, target);
    assert_eq!(std::fs::read_to_string(&html).unwrap(), REFERENCE);
    assert!(validate(&std::fs::read_to_string(&target).unwrap())
        .issues
        .is_empty());
}

#[tokio::test]
async fn non_utf8_html_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bin.html");
    std::fs::write(&path, [0xff, 0xfe, 0x00, 0x3c]).unwrap();
    let err = preprocess_file(&path, None).await.unwrap_err();
    assert!(matches!(err, Doc2MdError::NotText { .. }));
}

#[tokio::test]
async fn analyze_recommends_from_tables() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "a.docx", "PK");
    let config = ConversionConfig::builder()
        .engine(fixed_engine("<p>prose only</p>"))
        .build()
        .unwrap();

    let analysis = analyze(&input, &config).await;
    assert_eq!(analysis.stats.unwrap().tables, 0);
    assert_eq!(analysis.recommendations.len(), 1);
    assert_eq!(analysis.recommendations[0].format, OutputFormat::Markdown);
}

#[tokio::test]
async fn batch_names_outputs_after_stems() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "one.docx", "PK");
    write_file(dir.path(), "two.docx", "PK");
    write_file(dir.path(), "notes.txt", "x");
    let out_dir = dir.path().join("md");
    let config = ConversionConfig::builder()
        .two_step(true)
        .engine(fixed_engine("<table></table>"))
        .build()
        .unwrap();

    let pattern = format!("{}/*.docx", dir.path().display());
    let batch = convert_batch(&pattern, Some(&out_dir), &config).await.unwrap();
    assert_eq!(batch.stats.converted, 2);
    assert_eq!(
        batch.files.iter().map(|f| f.output.clone()).collect::<Vec<_>>(),
        vec![out_dir.join("one.md"), out_dir.join("two.md")]
    );
}

#[test]
fn sync_api_runs_without_a_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "a.docx", "PK");
    let config = ConversionConfig::builder()
        .engine(fixed_engine(""))
        .build()
        .unwrap();
    let out = doc2md::convert_sync(&input, &config).unwrap();
    assert!(out.text.starts_with("<markdown>"));
}

// ── Real pandoc ──────────────────────────────────────────────────────────────

/// Skip this test when pandoc cannot be found; otherwise yield its path.
macro_rules! skip_unless_pandoc {
    () => {{
        match pandoc_locate::ensure_pandoc() {
            Ok((path, _version)) => path,
            Err(e) => {
                println!("SKIP: {e}");
                return;
            }
        }
    }};
}

/// Build a DOCX with a merged-cell table by converting HTML with pandoc.
fn make_docx(pandoc: &Path, dir: &Path) -> PathBuf {
    let html = write_file(
        dir,
        "source.html",
        r#"<html><body>
<h1>Quarterly report</h1>
<table>
<tr><th>Region</th><th>Q1</th><th>Q2</th></tr>
<tr><td>North</td><td>10</td><td>12</td></tr>
<tr><td>South</td><td>8</td><td>9</td></tr>
</table>
</body></html>"#,
    );
    let docx = dir.join("report.docx");
    let status = std::process::Command::new(pandoc)
        .arg(&html)
        .arg("-o")
        .arg(&docx)
        .status()
        .unwrap();
    assert!(status.success(), "pandoc could not build the fixture");
    docx
}

#[tokio::test]
async fn pandoc_direct_conversion() {
    let pandoc = skip_unless_pandoc!();
    let dir = tempfile::tempdir().unwrap();
    let docx = make_docx(&pandoc, dir.path());
    let config = ConversionConfig::builder()
        .pandoc_path(&pandoc)
        .format(OutputFormat::Gfm)
        .build()
        .unwrap();

    let out = convert(&docx, &config).await.unwrap();
    assert!(out.text.contains("Quarterly report"), "{}", out.text);
    assert!(out.text.contains("North"));
}

#[tokio::test]
async fn pandoc_two_step_produces_pipe_table() {
    let pandoc = skip_unless_pandoc!();
    let dir = tempfile::tempdir().unwrap();
    let docx = make_docx(&pandoc, dir.path());
    let scratch = dir.path().join("tmp");
    std::fs::create_dir(&scratch).unwrap();
    let config = ConversionConfig::builder()
        .two_step(true)
        .pandoc_path(&pandoc)
        .temp_dir(&scratch)
        .build()
        .unwrap();

    let out_path = dir.path().join("report.md");
    let out = convert_to_file(&docx, &out_path, &config).await.unwrap();
    assert!(out.validation.unwrap().table_count >= 1);
    let md = std::fs::read_to_string(&out_path).unwrap();
    assert!(md.lines().any(|l| l.starts_with('|') && l.contains("Region")), "{md}");
    assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
}

#[tokio::test]
async fn pandoc_manual_steps() {
    let pandoc = skip_unless_pandoc!();
    let dir = tempfile::tempdir().unwrap();
    let docx = make_docx(&pandoc, dir.path());
    let config = ConversionConfig::builder()
        .pandoc_path(&pandoc)
        .build()
        .unwrap();

    let html = step1(&docx, None, &config).await.unwrap();
    let html_path = html.output_path.unwrap();
    assert!(std::fs::read_to_string(&html_path)
        .unwrap()
        .starts_with("<!-- HTML preprocessing: "));

    let md = step2(&html_path, None, &config).await.unwrap();
    assert_eq!(md.output_path.unwrap(), dir.path().join("report.md"));
    assert!(md.text.contains("South"));
}

#[tokio::test]
async fn pandoc_failure_is_reported_verbatim() {
    let pandoc = skip_unless_pandoc!();
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "broken.docx", "this is not a zip archive");
    let config = ConversionConfig::builder()
        .pandoc_path(&pandoc)
        .build()
        .unwrap();

    let out_path = dir.path().join("broken.md");
    let err = convert_to_file(&input, &out_path, &config).await.unwrap_err();
    match err {
        Doc2MdError::EngineFailed { message, .. } => assert!(!message.is_empty()),
        other => panic!("expected EngineFailed, got {other:?}"),
    }
    assert!(!out_path.exists());
}
