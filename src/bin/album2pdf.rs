//! CLI binary for album2pdf.
//!
//! A thin shim over the library crate that maps CLI flags onto
//! `AppConfig`, runs one album and prints the result.

use album2pdf::{AppConfig, Pipeline, PipelineProgressCallback, PipelineState, ProgressCallback};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

/// Spinner while the downloader runs, then a page bar during assembly.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Binding");
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_state_change(&self, state: PipelineState) {
        match state {
            PipelineState::Fetching => {
                self.bar.set_prefix("Fetching");
                self.bar.set_message("waiting for the downloader…");
            }
            PipelineState::CleaningUp => {
                self.bar.set_prefix("Cleaning up");
            }
            PipelineState::Done | PipelineState::Failed => self.bar.finish_and_clear(),
            _ => {}
        }
    }

    fn on_assembly_start(&self, total_images: usize) {
        self.activate_bar(total_images);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Binding {total_images} images…"))
        ));
    }

    fn on_page_complete(&self, _page_num: usize, _total: usize) {
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_assembly_complete(&self, total: usize, placed: usize) {
        if let Some(line) = self.skipped_summary(total, placed) {
            self.bar.println(line);
        }
    }
}

impl CliProgressCallback {
    /// One-line summary when any image was skipped.
    fn skipped_summary(&self, total: usize, placed: usize) -> Option<String> {
        let skipped = self.errors.load(Ordering::SeqCst);
        if skipped == 0 {
            return None;
        }
        Some(format!(
            "  {} {}/{} images placed  ({} skipped)",
            cyan("⚠"),
            placed,
            total,
            red(&skipped.to_string())
        ))
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Download album 422866 and bind it into ./PDF/<title>.pdf
  album2pdf 422866

  # Prompt for the id
  album2pdf

  # Custom output directory, through a proxy
  album2pdf 422866 --output-dir ~/comics --proxy 127.0.0.1:7890

  # Machine-readable report
  album2pdf 422866 --json > report.json

CONFIGURATION:
  Looked up in order: --config, $ALBUM2PDF_CONFIG, ./album2pdf.yml,
  <user config dir>/album2pdf/config.yml. All keys are optional:

    candidateHosts: [18comic-mygo.vip, jmcomic-zzz.one]
    outputDirectory: ./PDF
    retryBudget: 3
    downloadDirectory: .
    verifiedHostsFile: checked_api.txt
    jpegQuality: 95
    fetcher:
      program: jmcomic
      timeoutSecs: 1800
      imageThreads: 20
      dirRule: Bd_Aid

  A non-empty verifiedHostsFile (one host per line) replaces candidateHosts.

ENVIRONMENT VARIABLES:
  ALBUM2PDF_CONFIG   Config file path
  RUST_LOG           Log filter (overrides -v / -q)
"#;

/// Download a comic album and bind its images into a PDF.
#[derive(Parser, Debug)]
#[command(
    name = "album2pdf",
    version,
    about = "Download a comic album by id and bind its images into one PDF",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Numeric album id (prompted for when omitted).
    album_id: Option<String>,

    /// YAML config file.
    #[arg(short, long, env = "ALBUM2PDF_CONFIG")]
    config: Option<PathBuf>,

    /// Directory the PDF is written to.
    #[arg(short, long, env = "ALBUM2PDF_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Directory the downloader writes the album into.
    #[arg(long, env = "ALBUM2PDF_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Downloader timeout in seconds.
    #[arg(long, env = "ALBUM2PDF_FETCH_TIMEOUT")]
    fetch_timeout: Option<u64>,

    /// Proxy handed to the downloader unchanged.
    #[arg(long, env = "ALBUM2PDF_PROXY")]
    proxy: Option<String>,

    /// Print the run report as JSON on stdout.
    #[arg(long, env = "ALBUM2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "ALBUM2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ALBUM2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "ALBUM2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    match run(&cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", red("✘"), e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    let config = build_config(cli)?;

    let album_id = match cli.album_id {
        Some(ref id) => id.clone(),
        None => prompt_album_id()?,
    };

    let mut pipeline = Pipeline::new(config);
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        pipeline = pipeline.with_progress(cb);
    }

    let report = pipeline
        .run(&album_id)
        .await
        .with_context(|| format!("Album {} failed", album_id.trim()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
        return Ok(());
    }

    if !cli.quiet {
        eprintln!(
            "{}  {}/{} pages  {}ms  →  {}",
            if report.skipped.is_empty() {
                green("✔")
            } else {
                cyan("⚠")
            },
            report.pages_written,
            report.total_images,
            report.total_duration_ms,
            bold(&report.output_path.display().to_string()),
        );
        eprintln!(
            "   {}",
            dim(&format!(
                "fetch {}ms  /  assembly {}ms",
                report.fetch_duration_ms, report.assembly_duration_ms
            ))
        );
        for w in &report.cleanup_warnings {
            eprintln!("   {} {}", cyan("⚠"), w);
        }
    }
    Ok(())
}

/// Load the config file (if any) and apply CLI overrides.
fn build_config(cli: &Cli) -> Result<AppConfig> {
    let base = match cli.config.clone().or_else(AppConfig::discover) {
        Some(path) => AppConfig::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };

    let mut builder = base.into_builder();
    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(ref dir) = cli.download_dir {
        builder = builder.download_dir(dir);
    }
    if let Some(secs) = cli.fetch_timeout {
        builder = builder.fetch_timeout_secs(secs);
    }
    if cli.proxy.is_some() {
        builder = builder.proxy(cli.proxy.clone());
    }
    builder.build().context("Invalid configuration")
}

fn prompt_album_id() -> Result<String> {
    eprint!("{} ", bold("Album id:"));
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read album id from stdin")?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden_callback() -> CliProgressCallback {
        CliProgressCallback {
            bar: ProgressBar::hidden(),
            errors: AtomicUsize::new(0),
        }
    }

    #[test]
    fn summary_counts_reported_errors() {
        let cb = hidden_callback();
        cb.on_assembly_start(5);
        assert_eq!(cb.skipped_summary(5, 5), None);

        cb.on_page_error(2, 5, "decode failed");
        cb.on_page_error(4, 5, &"x".repeat(200));
        let line = cb.skipped_summary(5, 3).unwrap();
        assert!(line.contains("3/5 images placed"), "{line}");
        assert!(line.contains(&red("2")), "{line}");
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from(["album2pdf", "422866", "--json", "-o", "out"]).unwrap();
        assert_eq!(cli.album_id.as_deref(), Some("422866"));
        assert!(cli.json);
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
    }
}
