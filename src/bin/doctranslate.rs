//! CLI binary for doc-translate.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `SessionConfig`, drives one select → submit → review → export cycle and
//! prints the result.

use anyhow::{bail, Context, Result};
use clap::Parser;
use doc_translate::{
    HttpProcessingClient, RawInput, Session, SessionConfig, SessionError, SessionObserver,
    SessionState, TextVariant,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
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

// ── Terminal observer using indicatif ────────────────────────────────────────

/// Shows the rotating status phrase on a spinner while the service works,
/// and one summary line per settled state.
struct CliObserver {
    bar: ProgressBar,
    started: std::sync::Mutex<Option<Instant>>,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::hidden();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        Arc::new(Self {
            bar,
            started: std::sync::Mutex::new(None),
        })
    }

    fn elapsed(&self) -> String {
        let secs = self
            .started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }
}

impl SessionObserver for CliObserver {
    fn on_state_change(&self, state: &SessionState) {
        match state {
            SessionState::Ready { document } => {
                eprintln!(
                    "{} {}  {}",
                    green("◆"),
                    bold(document.display_name()),
                    dim(&format!("{}, {}", document.mime_type(), document.size_label()))
                );
            }
            SessionState::Processing { .. } => {
                if let Ok(mut started) = self.started.lock() {
                    *started = Some(Instant::now());
                }
                self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                self.bar.reset_elapsed();
                self.bar.set_prefix("Processing");
                self.bar.enable_steady_tick(Duration::from_millis(80));
            }
            SessionState::Succeeded { result, .. } => {
                self.bar.finish_and_clear();
                eprintln!(
                    "{} Processed  {}  {}",
                    green("✔"),
                    dim(&format!(
                        "{} / {} chars",
                        result.extracted_text.chars().count(),
                        result.translated_text.chars().count()
                    )),
                    self.elapsed()
                );
            }
            SessionState::Failed { message, .. } => {
                self.bar.finish_and_clear();
                eprintln!("{} {}  {}", red("✘"), red(message), self.elapsed());
            }
            SessionState::Idle => {}
        }
    }

    fn on_status(&self, phrase: &str) {
        self.bar.set_message(phrase.to_string());
    }

    fn on_notice(&self, notice: &SessionError) {
        let line = format!("{} {}", red("⚠"), notice);
        if self.bar.is_hidden() {
            eprintln!("{line}");
        } else {
            self.bar.println(line);
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Translate a scan and print the Nepali text
  doctranslate scan.pdf

  # Use the bundled sample document
  doctranslate --sample

  # Export the translation as a PDF into ./out
  doctranslate scan.jpg -o out --font NotoSansDevanagari-Regular.ttf

  # Export the extracted Tamang text instead
  doctranslate scan.png --variant extracted -o out

  # Check that the service is up
  doctranslate --check

ENVIRONMENT VARIABLES:
  DOCTRANSLATE_SERVICE     Base URL of the OCR/translation service
  DOCTRANSLATE_SAMPLE_URL  Where the sample document is served
  DOCTRANSLATE_FONT        TrueType font with Devanagari coverage (export)
  DOCTRANSLATE_PDFIUM      libpdfium file or directory (export)
  RUST_LOG                 Override log filter (e.g. doc_translate=debug)
"#;

/// Translate scanned Tamang documents to Nepali via the OCR/translation service.
#[derive(Parser, Debug)]
#[command(
    name = "doctranslate",
    version,
    about = "Translate scanned Tamang documents to Nepali",
    long_about = "Upload a scanned document (PDF or image) to the OCR/translation service, \
print the extracted Tamang text or its Nepali translation, and optionally export it as a PDF \
with an embedded Devanagari font.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document to translate (PDF, PNG, JPEG, BMP, TIFF).
    #[arg(conflicts_with = "sample")]
    input: Option<PathBuf>,

    /// Use the sample document instead of a local file.
    #[arg(long)]
    sample: bool,

    /// Export the displayed text as a PDF into this directory.
    #[arg(short, long, env = "DOCTRANSLATE_OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Which text to print and export: translated or extracted.
    #[arg(long, env = "DOCTRANSLATE_VARIANT", default_value = "translated")]
    variant: TextVariant,

    /// Base URL of the OCR/translation service.
    #[arg(long, env = "DOCTRANSLATE_SERVICE", default_value = "http://localhost:8000")]
    service: String,

    /// URL of the sample document.
    #[arg(long, env = "DOCTRANSLATE_SAMPLE_URL")]
    sample_url: Option<String>,

    /// TrueType font used when exporting (needs Devanagari glyphs).
    #[arg(long, env = "DOCTRANSLATE_FONT")]
    font: Option<PathBuf>,

    /// libpdfium shared library, or the directory containing it.
    #[arg(long, env = "DOCTRANSLATE_PDFIUM")]
    pdfium: Option<PathBuf>,

    /// Processing timeout in seconds.
    #[arg(long, env = "DOCTRANSLATE_TIMEOUT", default_value_t = 300)]
    timeout: u64,

    /// Print the text to stdout even when exporting.
    #[arg(long)]
    print: bool,

    /// Print both texts as JSON instead of plain text.
    #[arg(long)]
    json: bool,

    /// Only check that the service is reachable.
    #[arg(long)]
    check: bool,

    /// Disable the spinner.
    #[arg(long, env = "DOCTRANSLATE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCTRANSLATE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCTRANSLATE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; keep library INFO logs
    // out of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress;
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

    let config = build_config(&cli)?;

    // ── Health check ─────────────────────────────────────────────────────
    if cli.check {
        let client = HttpProcessingClient::new(&config)?;
        client
            .check_health()
            .await
            .with_context(|| format!("Service at {} is not healthy", config.service_url))?;
        if !cli.quiet {
            eprintln!("{} Service running at {}", green("✔"), bold(&config.service_url));
        }
        return Ok(());
    }

    let mut session = Session::new(config)?;
    if show_progress {
        session = session.with_observer(CliObserver::new());
    }

    // ── Select ───────────────────────────────────────────────────────────
    if cli.sample {
        session.use_sample();
    } else if let Some(ref path) = cli.input {
        let raw = RawInput::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        session.select_input(raw);
    }
    session.run_until_settled().await;
    if let Some(notice) = session.notice() {
        bail!("{notice}");
    }

    // ── Submit ───────────────────────────────────────────────────────────
    session.submit()?;
    let message = match session.run_until_settled().await {
        SessionState::Failed { message, .. } => Some(message.clone()),
        _ => None,
    };
    if let Some(message) = message {
        bail!("Processing failed: {message}");
    }
    session.switch_variant(cli.variant);

    // ── Output ───────────────────────────────────────────────────────────
    if cli.print || cli.json || cli.output.is_none() {
        print_result(&session, cli.json, cli.quiet)?;
    }

    if let Some(ref dir) = cli.output {
        let path = session
            .export_to_file(dir)
            .await
            .context("Export failed")?;
        if !cli.quiet {
            eprintln!(
                "{} {} text  →  {}",
                green("✔"),
                cli.variant,
                bold(&path.display().to_string())
            );
        }
    }

    Ok(())
}

/// Map CLI args to `SessionConfig`.
fn build_config(cli: &Cli) -> Result<SessionConfig> {
    let mut builder = SessionConfig::builder()
        .service_url(&cli.service)
        .request_timeout_secs(cli.timeout);
    if let Some(ref url) = cli.sample_url {
        builder = builder.sample_asset_url(url);
    }
    if let Some(ref font) = cli.font {
        builder = builder.font_path(font);
    }
    if let Some(ref pdfium) = cli.pdfium {
        builder = builder.pdfium_library_path(pdfium);
    }
    builder.build().context("Invalid configuration")
}

fn print_result(session: &Session, json: bool, quiet: bool) -> Result<()> {
    let state = session.state();
    let Some(result) = state.result() else {
        bail!("No result to print (state: {})", state.name());
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if json {
        let out = serde_json::to_string_pretty(result).context("Failed to serialise result")?;
        writeln!(handle, "{out}").context("Failed to write to stdout")?;
    } else {
        if let (Some(variant), false) = (state.variant(), quiet) {
            eprintln!("{}", bold(variant.heading()));
        }
        let text = state.active_text().unwrap_or_default();
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        // Ensure a trailing newline on stdout.
        if !text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }
    Ok(())
}
