//! CLI binary for cardslice.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, shows progress, and writes the deck package.

use anyhow::{bail, Context, Result};
use cardslice::{
    extract_to_package, inspect, ExtractionConfig, ExtractionProgressCallback, PageTemplate,
    ProgressCallback,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and a per-input
/// log line. Works correctly when inputs complete out-of-order (concurrent
/// mode).
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-input wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_images: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>2}/{len} scans  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_length(total_images as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Slicing");
    }

    fn on_image_start(&self, image_num: usize, _total: usize) {
        self.start_times
            .lock()
            .unwrap()
            .insert(image_num, Instant::now());
        self.bar.set_message(format!("scan {image_num}"));
    }

    fn on_image_complete(&self, image_num: usize, total: usize, cards: usize) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&image_num)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} Scan {:>2}/{:<2}  {:<10}  {}",
            green("✓"),
            image_num,
            total,
            dim(&format!("{cards:>3} cards")),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, image_num: usize, total: usize, error: String) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.start_times.lock().unwrap().remove(&image_num);

        // Keep the log line on one row.
        let msg = error.replace('\n', "; ");
        let msg = if msg.chars().count() > 90 {
            let truncated: String = msg.chars().take(89).collect();
            format!("{truncated}\u{2026}")
        } else {
            msg
        };
        self.bar.println(format!(
            "  {} Scan {:>2}/{:<2}  {}",
            red("✗"),
            image_num,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_images: usize, success_count: usize) {
        let failed = total_images.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} scan(s) sliced successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} scans sliced  ({} failed)",
                cyan("⚠"),
                bold(&success_count.to_string()),
                total_images,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One reMarkable page export → deck.apkg
  cardslice notes-p4.png

  # A whole chapter, exported under a named deck
  cardslice chapter3-*.png -o biology.apkg --deck-name "Biology — Chapter 3"

  # Multi-page PDF export from the tablet
  cardslice chapter3.pdf -o biology.apkg

  # A4 paper scanned on a flatbed, darker pen threshold
  cardslice -p a4-portrait --black-threshold 140 scan.png

  # The scan has answers on the left: swap every card
  cardslice --switch-front-back notes.png

  # Where did the detector think the cards are? (JSON, no export)
  cardslice --layout-only notes.png

PAGE TEMPLATES:
  rm-portrait (default)   156.986 × 209.550 mm   reMarkable tablet
  rm-landscape            209.550 × 156.986 mm
  a4-portrait             210.0   × 297.0   mm
  a4-landscape            297.0   × 210.0   mm
  letter-portrait         215.9   × 279.4   mm
  letter-landscape        279.4   × 215.9   mm

TEMPLATE CALIBRATION:
  The defaults are calibrated for reMarkable's 'Dots S' template: separator
  search bands are one grid box wide, clearances half a box, and the ink
  threshold of 191 sits just under the printed grid's intensity of 192.
  For other templates start with --layout-only and adjust --black-threshold
  and --separator-threshold until the detected grid matches the page.
"#;

/// Slice scanned grid-layout notebook pages into Anki flashcard decks.
#[derive(Parser, Debug)]
#[command(
    name = "cardslice",
    version,
    about = "Slice scanned grid-layout notebook pages into Anki flashcard decks",
    long_about = "Convert scanned notebook pages (PDF, SVG, or PNG) into an Anki .apkg deck. \
Pages follow a simple template: card rows divided by horizontal lines, each row split into \
front and back halves by a vertical line. Detection is purely geometric — no OCR.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Scan files to slice (PDF, SVG, or PNG), in deck order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write the deck package to this file.
    #[arg(short, long, env = "CARDSLICE_OUTPUT", default_value = "deck.apkg")]
    output: PathBuf,

    /// Page standard for physical dimensions: rm-portrait, rm-landscape,
    /// a4-portrait, a4-landscape, letter-portrait, letter-landscape.
    #[arg(short = 'p', long, env = "CARDSLICE_PAGE", default_value = "rm-portrait")]
    page: String,

    /// Page width in millimetres; overrides the --page template.
    #[arg(long)]
    page_width: Option<f64>,

    /// Page height in millimetres; overrides the --page template.
    #[arg(long)]
    page_height: Option<f64>,

    /// Clearance kept to the separator lines, in mm.
    #[arg(short = 'c', long)]
    separator_clearance: Option<f64>,

    /// Margin above the page before the separator search begins, in mm.
    #[arg(long, visible_alias = "mt")]
    margin_top: Option<f64>,

    /// Margin on the left before the horizontal separator search band, in mm.
    #[arg(long, visible_alias = "ml")]
    margin_left: Option<f64>,

    /// Height of the vertical-separator search band per card row, in mm.
    #[arg(long, visible_alias = "vsh")]
    vertical_separator_height: Option<f64>,

    /// Width of the horizontal-separator search band, in mm.
    #[arg(long, visible_alias = "hsw")]
    horizontal_separator_width: Option<f64>,

    /// Clearance around detected card content before cropping, in mm.
    /// Defaults to --separator-clearance.
    #[arg(long, visible_alias = "cc")]
    card_clearance: Option<f64>,

    /// Grayscale value at or below which a pixel counts as ink (0–255).
    #[arg(long, env = "CARDSLICE_BLACK_THRESHOLD", default_value_t = 191)]
    black_threshold: u8,

    /// Fraction of a scan line that must be ink to count as a separator
    /// (0.0–1.0).
    #[arg(long, env = "CARDSLICE_SEPARATOR_THRESHOLD", default_value_t = 0.2)]
    separator_threshold: f64,

    /// Swap front and back of every card.
    #[arg(long)]
    switch_front_back: bool,

    /// Deck name shown in Anki. Defaults to the output file stem.
    #[arg(long, env = "CARDSLICE_DECK_NAME")]
    deck_name: Option<String>,

    /// Explicit Anki deck id. Defaults to a stable hash of the deck name.
    #[arg(long)]
    deck_id: Option<i64>,

    /// Longest rendered edge in pixels for PDF/SVG inputs.
    #[arg(long, env = "CARDSLICE_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,

    /// Number of scans processed concurrently.
    #[arg(long, env = "CARDSLICE_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Print the detected layout as JSON and exit without exporting.
    #[arg(long)]
    layout_only: bool,

    /// Print a machine-readable extraction report as JSON.
    #[arg(long, env = "CARDSLICE_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "CARDSLICE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CARDSLICE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CARDSLICE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.layout_only;
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

    let config = build_config(&cli, show_progress)?;

    // ── Layout-only mode ─────────────────────────────────────────────────
    if cli.layout_only {
        let mut entries = Vec::new();
        for input in &cli.inputs {
            let pages = inspect(input, &config)
                .await
                .with_context(|| format!("layout inspection failed for {}", input.display()))?;
            entries.push(serde_json::json!({
                "path": input,
                "pages": pages,
            }));
        }
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("failed to serialise layout")?
        );
        return Ok(());
    }

    // ── Run extraction and export ────────────────────────────────────────
    let output = extract_to_package(&cli.inputs, &cli.output, &config)
        .await
        .context("extraction failed")?;

    if cli.json {
        let report = serde_json::json!({
            "output": cli.output,
            "deck_name": config.deck_name,
            "reports": output.reports,
            "stats": output.stats,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialise report")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {} cards from {}/{} scans  {}ms  →  {}",
            if output.stats.failed_images == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            bold(&output.stats.total_cards.to_string()),
            output.stats.processed_images,
            output.stats.total_images,
            output.stats.total_duration_ms,
            bold(&cli.output.display().to_string()),
        );
        for report in output.reports.iter().filter(|r| r.error.is_some()) {
            eprintln!(
                "   {} {}: {}",
                red("✗"),
                report.path.display(),
                report.error.as_ref().map(|e| e.to_string()).unwrap_or_default(),
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, show_progress: bool) -> Result<ExtractionConfig> {
    let template = parse_page_template(&cli.page)?;

    let mut builder = ExtractionConfig::builder()
        .page_template(template)
        .black_threshold(cli.black_threshold)
        .separator_threshold(cli.separator_threshold)
        .switch_front_back(cli.switch_front_back)
        .max_rendered_pixels(cli.max_pixels)
        .concurrency(cli.concurrency);

    if let Some(w) = cli.page_width {
        builder = builder.page_width(w);
    }
    if let Some(h) = cli.page_height {
        builder = builder.page_height(h);
    }
    if let Some(v) = cli.separator_clearance {
        builder = builder.separator_clearance(v);
    }
    if let Some(v) = cli.margin_top {
        builder = builder.margin_top(v);
    }
    if let Some(v) = cli.margin_left {
        builder = builder.margin_left(v);
    }
    if let Some(v) = cli.vertical_separator_height {
        builder = builder.vertical_separator_height(v);
    }
    if let Some(v) = cli.horizontal_separator_width {
        builder = builder.horizontal_separator_width(v);
    }
    if let Some(v) = cli.card_clearance {
        builder = builder.card_clearance(v);
    }

    let deck_name = cli.deck_name.clone().unwrap_or_else(|| {
        cli.output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Scanned flashcards".to_string())
    });
    builder = builder.deck_name(deck_name);
    if let Some(id) = cli.deck_id {
        builder = builder.deck_id(id);
    }

    if show_progress {
        let cb = CliProgressCallback::new();
        builder = builder.progress_callback(cb as ProgressCallback);
    }

    builder.build().context("invalid configuration")
}

/// Parse `--page` into a `PageTemplate`.
fn parse_page_template(s: &str) -> Result<PageTemplate> {
    match s.to_lowercase().as_str() {
        "rm-portrait" | "rm" => Ok(PageTemplate::RemarkablePortrait),
        "rm-landscape" => Ok(PageTemplate::RemarkableLandscape),
        "a4-portrait" | "a4" => Ok(PageTemplate::A4Portrait),
        "a4-landscape" => Ok(PageTemplate::A4Landscape),
        "letter-portrait" | "letter" => Ok(PageTemplate::LetterPortrait),
        "letter-landscape" => Ok(PageTemplate::LetterLandscape),
        other => bail!(
            "invalid page standard '{other}'; expected one of rm-portrait, rm-landscape, \
             a4-portrait, a4-landscape, letter-portrait, letter-landscape"
        ),
    }
}
