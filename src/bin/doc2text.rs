//! CLI binary for edgequake-doc2text.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_doc2text::extract::write_atomic;
use edgequake_doc2text::{
    load_document, Diagnostics, ExtractionConfig, ExtractionObserver, ExtractionSource,
    ExtractionState, Extractor, MediaType,
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress observer using indicatif ────────────────────────────────────

/// Spinner that follows the orchestrator through its states and counts pages.
struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Starting");
        bar.set_message("Reading document…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ExtractionObserver for CliObserver {
    fn on_state_change(&self, state: ExtractionState) {
        let (prefix, msg) = match state {
            ExtractionState::NotStarted => ("Starting", "Reading document…"),
            ExtractionState::PrimaryAttempted => ("Extracting", "Waiting for pdfium…"),
            ExtractionState::FallbackAttempted => ("Recovering", "Decoding raw bytes…"),
            ExtractionState::Accepted => ("Done", "Text accepted"),
            ExtractionState::Rejected => ("Failed", "No readable text"),
        };
        self.bar.set_prefix(prefix);
        self.bar.set_message(msg);
        if state == ExtractionState::Rejected {
            self.bar.finish_and_clear();
            eprintln!("{} no readable text recovered", red("✘"));
        }
    }

    fn on_page_extracted(&self, page_num: usize, total_pages: usize, chars: usize) {
        self.bar
            .set_message(format!("page {page_num}/{total_pages}  {}", dim(&format!("{chars} chars"))));
    }

    fn on_complete(&self, diagnostics: &Diagnostics) {
        self.bar.finish_and_clear();
        let mark = match diagnostics.source {
            ExtractionSource::FallbackEncoding => cyan("⚠"),
            _ => green("✔"),
        };
        eprintln!(
            "{} {} characters via {}",
            mark,
            bold(&diagnostics.character_count.to_string()),
            diagnostics.source
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract to stdout
  doc2text resume.pdf

  # Extract to a file
  doc2text resume.pdf -o resume.txt

  # Treat an extension-less upload as plain text
  doc2text --media-type text upload.bin

  # JSON output with diagnostics (source, classification, state path)
  doc2text --json resume.pdf > resume.json

  # Use a specific pdfium build and a shorter readiness timeout
  doc2text --pdfium-lib /opt/pdfium/lib/libpdfium.so --provider-timeout 3 resume.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH               Path to an existing libpdfium
  DOC2TEXT_OUTPUT               Same as -o
  DOC2TEXT_MEDIA_TYPE           Same as --media-type
  DOC2TEXT_PROVIDER_TIMEOUT     Same as --provider-timeout
  DOC2TEXT_MIN_CANDIDATE_CHARS  Same as --min-candidate-chars
  DOC2TEXT_MAX_BYTES            Same as --max-bytes
  RUST_LOG                      Overrides -v / -q log filtering

EXIT STATUS:
  0  text extracted
  1  extraction failed; a hint is printed when retrying may help
"#;

/// Extract readable text from PDF and plain-text documents.
#[derive(Parser, Debug)]
#[command(
    name = "doc2text",
    version,
    about = "Extract readable, sanitized text from PDF and plain-text documents",
    long_about = "Extract text from a PDF with pdfium, check it is prose rather than leaked \
document syntax, fall back to multi-encoding recovery from the raw bytes when it is not, and \
print the sanitized result.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document to extract.
    input: PathBuf,

    /// Write text to this file instead of stdout.
    #[arg(short, long, env = "DOC2TEXT_OUTPUT")]
    output: Option<PathBuf>,

    /// Media type; detected from extension and content if not given.
    #[arg(long, env = "DOC2TEXT_MEDIA_TYPE", value_enum)]
    media_type: Option<MediaTypeArg>,

    /// Output structured JSON (text + diagnostics) instead of plain text.
    #[arg(long, env = "DOC2TEXT_JSON")]
    json: bool,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Seconds to wait for pdfium to become ready.
    #[arg(long, env = "DOC2TEXT_PROVIDER_TIMEOUT", default_value_t = 10.0)]
    provider_timeout: f64,

    /// Fallback text must be longer than this many characters.
    #[arg(long, env = "DOC2TEXT_MIN_CANDIDATE_CHARS", default_value_t = 50)]
    min_candidate_chars: usize,

    /// Refuse input files larger than this many bytes.
    #[arg(long, env = "DOC2TEXT_MAX_BYTES", default_value_t = edgequake_doc2text::DEFAULT_MAX_INPUT_BYTES)]
    max_bytes: u64,

    /// Disable the progress spinner.
    #[arg(long, env = "DOC2TEXT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2TEXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2TEXT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum MediaTypeArg {
    Pdf,
    Text,
}

impl From<MediaTypeArg> for MediaType {
    fn from(v: MediaTypeArg) -> Self {
        match v {
            MediaTypeArg::Pdf => MediaType::Pdf,
            MediaTypeArg::Text => MediaType::PlainText,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO-level library logs.
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

    let observer = show_progress.then(CliObserver::new);
    let config = build_config(&cli, observer.clone())?;

    let start = Instant::now();
    let doc = load_document(&cli.input, cli.media_type.map(Into::into), config.max_input_bytes)
        .await
        .with_context(|| format!("Failed to load {}", cli.input.display()))?;

    let extractor = Extractor::pdfium(config);
    let output = match extractor.extract(&doc).await {
        Ok(output) => output,
        Err(e) => {
            if let Some(obs) = &observer {
                obs.bar.finish_and_clear();
            }
            if e.is_retryable() {
                eprintln!(
                    "{} pdfium was not ready in time; retrying may succeed \
                     (or raise --provider-timeout / set PDFIUM_LIB_PATH)",
                    cyan("hint:")
                );
            }
            return Err(anyhow::Error::new(e).context("Extraction failed"));
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        match &cli.output {
            Some(path) => write_atomic(path, &json).await?,
            None => println!("{json}"),
        }
    } else if let Some(path) = &cli.output {
        write_atomic(path, output.text.as_str()).await?;
        if !cli.quiet {
            eprintln!(
                "{}  {} chars  {}ms  →  {}",
                green("✔"),
                output.diagnostics.character_count,
                start.elapsed().as_millis(),
                bold(&path.display().to_string()),
            );
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.text.as_str().as_bytes())
            .context("Failed to write to stdout")?;
        handle.write_all(b"\n").ok();
    }

    if !cli.quiet && !show_progress && !cli.json {
        eprintln!(
            "Extracted {} characters via {} in {}ms",
            output.diagnostics.character_count,
            output.diagnostics.source,
            start.elapsed().as_millis()
        );
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, observer: Option<Arc<CliObserver>>) -> Result<ExtractionConfig> {
    let timeout = Duration::try_from_secs_f64(cli.provider_timeout).with_context(|| {
        format!(
            "--provider-timeout must be a positive number of seconds, got {}",
            cli.provider_timeout
        )
    })?;

    let mut builder = ExtractionConfig::builder()
        .provider_timeout(timeout)
        .min_candidate_chars(cli.min_candidate_chars)
        .max_input_bytes(cli.max_bytes);

    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_library(path);
    }
    if let Some(obs) = observer {
        builder = builder.observer(obs);
    }

    builder.build().context("Invalid configuration")
}
