//! CLI binary for doc2md.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use doc2md::{
    analyze, convert, convert_batch, convert_to_file, default_output_path, preprocess_file,
    step1, step2, validate_file, BatchProgressCallback, ConversionConfig, ConversionOutput,
    OutputFormat, ProgressCallback, Strategy, ValidationReport, DEFAULT_PATTERN,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress for `--batch`: a bar anchored at the bottom and one log
/// line per file. Files may finish out of order with `-j > 1`.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_batch_start` tells us how many files there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Expanding pattern…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.activate_bar(total_files);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_files} file(s)…"))
        ));
    }

    fn on_file_start(&self, input: &Path, index: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
        self.bar.set_message(input.display().to_string());
    }

    fn on_file_complete(&self, input: &Path, output: &Path, index: usize, total: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} {:>3}/{:<3} {} → {}  {}",
            green("✓"),
            index,
            total,
            input.display(),
            output.display(),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, input: &Path, index: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // First line only; pandoc diagnostics can run long.
        let first = error.lines().next().unwrap_or(error);
        let msg = if first.chars().count() > 100 {
            format!("{}\u{2026}", first.chars().take(99).collect::<String>())
        } else {
            first.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3} {}  {}  {}",
            red("✗"),
            index,
            total,
            input.display(),
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = total_files.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} file(s) converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} file(s) converted  ({} failed)",
                if failed == total_files {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Direct conversion (writes report.md)
  doc2md report.docx

  # Through HTML with table repair, GFM pipe tables
  doc2md --two-step report.docx report.md

  # Grid tables, which keep multi-line cells
  doc2md --two-step --format grid report.docx

  # Keep the repaired intermediate HTML for inspection
  doc2md --two-step --keep-html report.html report.docx

  # Print to stdout
  doc2md report.docx -

  # Every .docx in a directory, 4 at a time, into out/
  doc2md --batch 'docs/*.docx' out -j 4

  # Manual two-step: inspect or edit the HTML between the hops
  doc2md --step1 report.docx report.html
  doc2md --preprocess report.html
  doc2md --step2 report.html report.md

  # Table diagnostics (no pandoc needed)
  doc2md --validate report.html --json

  # Which strategy suits this document?
  doc2md --analyze report.docx

FORMATS:
  markdown (md)   pandoc Markdown (default for direct conversion)
  gfm             GitHub-Flavored Markdown (default for --two-step and --step2)
  grid            Markdown with grid tables only
  html            HTML
  <other>         any pandoc writer name, passed through

ENVIRONMENT VARIABLES:
  PANDOC_PATH          Path to the pandoc executable (skips the search)
  DOC2MD_FORMAT        Default --format
  DOC2MD_TWO_STEP      Default --two-step
  DOC2MD_CONCURRENCY   Default -j for --batch
  DOC2MD_VERBOSE       Enable debug logs
  DOC2MD_QUIET         Errors only
  RUST_LOG             Fine-grained log filter, overrides the above

SETUP:
  pandoc 2.0 or newer must be installed: https://pandoc.org/installing.html
  doc2md looks in PANDOC_PATH, then PATH, then the usual install directories.
"#;

/// Convert office documents to Markdown through pandoc.
#[derive(Parser, Debug)]
#[command(
    name = "doc2md",
    version,
    about = "Convert office documents to Markdown through pandoc, repairing tables",
    long_about = "Convert DOCX, PPTX and other pandoc-readable documents to Markdown. \
The --two-step mode converts through HTML and repairs table markup between the hops, \
which keeps merged cells and drops phantom columns left by hidden Word columns.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input and optional output. With --batch: pattern and output directory.
    /// An output of `-` writes to stdout.
    #[arg(value_name = "PATH", num_args = 0..=2)]
    paths: Vec<String>,

    /// Convert every file matching a glob pattern (default `*.docx`).
    #[arg(long, group = "mode")]
    batch: bool,

    /// Manual first hop: document → preprocessed HTML.
    #[arg(long, group = "mode")]
    step1: bool,

    /// Manual second hop: HTML → Markdown. Targets gfm, not plain
    /// markdown, unless --format is given.
    #[arg(long, group = "mode")]
    step2: bool,

    /// Report table structure of an HTML file. Does not need pandoc.
    #[arg(long, group = "mode")]
    validate: bool,

    /// Repair table markup of an HTML file in place or into a new file.
    /// Does not need pandoc.
    #[arg(long, group = "mode")]
    preprocess: bool,

    /// Analyse a document's tables and recommend a conversion strategy.
    #[arg(long, group = "mode")]
    analyze: bool,

    /// Target format: markdown, gfm, grid, html, or any pandoc writer.
    #[arg(short, long, env = "DOC2MD_FORMAT")]
    format: Option<String>,

    /// Convert through HTML, repairing tables between the hops.
    #[arg(long, env = "DOC2MD_TWO_STEP")]
    two_step: bool,

    /// Skip table repair in --two-step and --step1.
    #[arg(long)]
    no_preprocess: bool,

    /// Keep the intermediate HTML of --two-step at this path.
    #[arg(long, value_name = "PATH")]
    keep_html: Option<PathBuf>,

    /// Files converted at once in --batch.
    #[arg(short = 'j', long, env = "DOC2MD_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Extra pandoc argument for the final hop (repeatable).
    /// Replaces the default `--wrap=none`.
    #[arg(long = "pandoc-arg", value_name = "ARG", allow_hyphen_values = true)]
    pandoc_args: Vec<String>,

    /// Print results as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable the --batch progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2MD_QUIET")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Convert,
    Batch,
    Step1,
    Step2,
    Validate,
    Preprocess,
    Analyze,
}

impl Mode {
    fn needs_pandoc(self) -> bool {
        !matches!(self, Mode::Validate | Mode::Preprocess)
    }
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.batch {
            Mode::Batch
        } else if self.step1 {
            Mode::Step1
        } else if self.step2 {
            Mode::Step2
        } else if self.validate {
            Mode::Validate
        } else if self.preprocess {
            Mode::Preprocess
        } else if self.analyze {
            Mode::Analyze
        } else {
            Mode::Convert
        }
    }

    fn input(&self) -> Result<PathBuf> {
        match self.paths.first() {
            Some(p) => Ok(PathBuf::from(p)),
            None => bail!("missing input file (see --help)"),
        }
    }

    fn second(&self) -> Option<&str> {
        self.paths.get(1).map(String::as_str)
    }

    fn output(&self) -> Option<PathBuf> {
        self.second().map(PathBuf::from)
    }
}

/// Like `Cli::parse`, but every usage error exits with status 1.
fn parse_args() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            std::process::exit(code);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_args();
    let mode = cli.mode();

    // ── Logging setup ────────────────────────────────────────────────────
    // The batch progress bar gives all the feedback that matters; keep
    // INFO logs from interleaving with it.
    let show_progress = mode == Mode::Batch && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Ensure pandoc is available ───────────────────────────────────────
    // --validate and --preprocess work on HTML alone.
    let pandoc = if mode.needs_pandoc() {
        let (path, version) =
            pandoc_locate::ensure_pandoc().context("pandoc is required for this mode")?;
        info!("Using pandoc {} at {}", version, path.display());
        Some(path)
    } else {
        None
    };

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, pandoc, progress_cb)?;

    match mode {
        Mode::Convert => run_convert(&cli, &config).await,
        Mode::Batch => run_batch(&cli, &config).await,
        Mode::Step1 => {
            let out = step1(cli.input()?, cli.output().as_deref(), &config)
                .await
                .context("Step 1 failed")?;
            report_written(&cli, &out)
        }
        Mode::Step2 => {
            let out = step2(cli.input()?, cli.output().as_deref(), &config)
                .await
                .context("Step 2 failed")?;
            report_written(&cli, &out)
        }
        Mode::Validate => run_validate(&cli),
        Mode::Preprocess => run_preprocess(&cli).await,
        Mode::Analyze => run_analyze(&cli, &config).await,
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(
    cli: &Cli,
    pandoc: Option<PathBuf>,
    progress: Option<ProgressCallback>,
) -> Result<ConversionConfig> {
    let strategy = if cli.two_step || cli.keep_html.is_some() {
        Strategy::TwoStep
    } else {
        Strategy::Direct
    };

    let mut builder = ConversionConfig::builder()
        .strategy(strategy)
        .preprocess(!cli.no_preprocess)
        .concurrency(cli.concurrency);

    if let Some(path) = pandoc {
        builder = builder.pandoc_path(path);
    }
    if let Some(ref f) = cli.format {
        let format: OutputFormat = f.parse().context("Invalid --format")?;
        builder = builder.format(format);
    }
    if !cli.pandoc_args.is_empty() {
        builder = builder.extra_args(cli.pandoc_args.iter().cloned());
    }
    // Batches use one scoped intermediate per file.
    if let Some(ref keep) = cli.keep_html {
        if !cli.batch {
            builder = builder.intermediate_path(keep);
        }
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn run_convert(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    let input = cli.input()?;

    if cli.second() == Some("-") {
        let output = convert(&input, config).await.context("Conversion failed")?;
        if cli.json {
            print_json(&output)?;
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(output.text.as_bytes())
                .context("Failed to write to stdout")?;
            if !output.text.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
        print_changes(cli, &output);
        return Ok(());
    }

    let output_path = cli
        .output()
        .unwrap_or_else(|| default_output_path(&input, config));
    let output = convert_to_file(&input, &output_path, config)
        .await
        .context("Conversion failed")?;
    report_written(cli, &output)
}

async fn run_batch(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    let pattern = cli.paths.first().map(String::as_str).unwrap_or(DEFAULT_PATTERN);
    let output_dir = cli.output();
    let batch = convert_batch(pattern, output_dir.as_deref(), config)
        .await
        .context("Batch conversion failed")?;

    if cli.json {
        print_json(&batch)?;
    } else if !cli.quiet && config.progress_callback.is_none() {
        for file in &batch.files {
            match file.error {
                None => eprintln!(
                    "{} {} → {}",
                    green("✓"),
                    file.input.display(),
                    file.output.display()
                ),
                Some(ref e) => eprintln!("{} {}", red("✗"), e),
            }
        }
    }

    if batch.stats.matched == 0 {
        if !cli.quiet {
            eprintln!("{} no files match '{}'", yellow("⚠"), pattern);
        }
        return Ok(());
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "   {}/{} converted  {}ms",
            batch.stats.converted, batch.stats.matched, batch.stats.total_duration_ms
        );
    }
    if batch.stats.failed > 0 {
        bail!(
            "{} of {} file(s) failed to convert",
            batch.stats.failed,
            batch.stats.matched
        );
    }
    Ok(())
}

async fn run_analyze(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    let input = cli.input()?;
    let analysis = analyze(&input, config).await;

    if cli.json {
        return print_json(&analysis);
    }

    println!("{}", bold(&input.display().to_string()));
    match (&analysis.stats, &analysis.error) {
        (Some(stats), _) => {
            println!("  Tables:         {}", stats.tables);
            println!("  colspan cells:  {}", stats.colspan_cells);
            println!("  rowspan cells:  {}", stats.rowspan_cells);
            if let Some(ref report) = analysis.report {
                for issue in &report.issues {
                    println!("  {} {}", red("issue"), issue);
                }
            }
        }
        (None, Some(err)) => println!("  {} {}", yellow("analysis failed:"), err),
        (None, None) => {}
    }
    println!("\n{}", bold("Recommended:"));
    for (i, rec) in analysis.recommendations.iter().enumerate() {
        println!("  {}. {}", i + 1, rec);
    }
    Ok(())
}

fn run_validate(cli: &Cli) -> Result<()> {
    let input = cli.input()?;
    let report = validate_file(&input).context("Validation failed")?;

    if cli.json {
        return print_json(&report);
    }
    println!("{}", bold(&input.display().to_string()));
    print_report(&report);
    Ok(())
}

async fn run_preprocess(cli: &Cli) -> Result<()> {
    let input = cli.input()?;
    let output = cli.output();
    let out = preprocess_file(&input, output.as_deref())
        .await
        .context("Preprocessing failed")?;

    if cli.json {
        return print_json(&serde_json::json!({
            "output_path": out.output_path,
            "changes": out.result.change_log(),
            "validation": out.validation,
        }));
    }
    if !cli.quiet {
        print_report(&out.validation);
        if out.result.is_unchanged() {
            eprintln!("{} no changes needed", dim("–"));
        }
        for line in out.result.change_log() {
            eprintln!("{} {}", green("✓"), line);
        }
        eprintln!("   →  {}", bold(&out.output_path.display().to_string()));
    }
    Ok(())
}

// ── Output helpers ───────────────────────────────────────────────────────────

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}

fn print_report(report: &ValidationReport) {
    println!("  Tables: {}", report.table_count);
    for issue in &report.issues {
        println!("  {} {}", red("✗"), issue);
    }
    for warning in &report.warnings {
        println!("  {} {}", yellow("⚠"), warning);
    }
    if report.is_clean() {
        println!("  {} no table issues", green("✔"));
    }
}

fn print_changes(cli: &Cli, output: &ConversionOutput) {
    if cli.quiet {
        return;
    }
    for change in &output.changes {
        eprintln!("  {} {}", dim("·"), change);
    }
}

fn report_written(cli: &Cli, output: &ConversionOutput) -> Result<()> {
    if cli.json {
        return print_json(output);
    }
    print_changes(cli, output);
    if !cli.quiet {
        if let Some(ref path) = output.output_path {
            eprintln!(
                "{}  {}  {}ms  →  {}",
                green("✔"),
                output.format,
                output.stats.total_duration_ms,
                bold(&path.display().to_string()),
            );
        }
        if let Some(ref kept) = output.intermediate_path {
            eprintln!("   HTML kept at {}", kept.display());
        }
    }
    Ok(())
}
