//! # cardslice
//!
//! Slice scanned grid-layout notebook pages into Anki flashcard decks.
//!
//! ## Why this crate?
//!
//! Writing flashcards by hand on a tablet is fast; re-typing them into Anki
//! is not. If the page follows a simple template — card rows divided by
//! horizontal lines, each row split into a question half and an answer half
//! by a vertical line — the layout can be recovered geometrically: no OCR,
//! no machine learning, just ink-density statistics over the scanned raster.
//!
//! ## Pipeline Overview
//!
//! ```text
//! scan (PDF / SVG / PNG)
//!  │
//!  ├─ 1. Input    validate path, suffix, and magic bytes
//!  ├─ 2. Render   decode to raster pages (pdfium / resvg / image)
//!  ├─ 3. Layout   find separator bands, partition into card rows
//!  ├─ 4. Refine   tighten each cell to its ink, pad by a clearance
//!  ├─ 5. Crop     cut front/back images from the original raster
//!  └─ 6. Export   write a self-contained .apkg deck
//! ```
//!
//! All physical settings are in millimetres and are converted per image, so
//! one configuration handles scans of any resolution.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cardslice::{extract_to_package, ExtractionConfig};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .deck_name("Biology — Chapter 3")
//!         .build()?;
//!     let inputs = vec![PathBuf::from("notebook-page.png")];
//!     let output = extract_to_package(&inputs, "biology.apkg", &config).await?;
//!     eprintln!("{} cards exported", output.stats.total_cards);
//!     Ok(())
//! }
//! ```
//!
//! ## Failure model
//!
//! A scan that does not match the template fails loudly: a card row with
//! zero or two vertical dividers, or a card region with no ink at all, marks
//! that input as failed and the batch moves on. No partial or guessed cards
//! are ever emitted; inspect the per-input reports (or run the layout
//! inspection) to see what the detector actually found.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cardslice` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! cardslice = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod geometry;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, FileType, PageTemplate};
pub use error::{CardSliceError, ImageError};
pub use extract::{extract, extract_sync, extract_to_package, inspect};
pub use geometry::Rectangle;
pub use output::{ExtractionOutput, ExtractionStats, Flashcard, ImageReport, PageLayout};
pub use pipeline::bounds::CardBoundary;
pub use pipeline::layout::{CardBox, GridLayout};
pub use pipeline::separators::ScanAxis;
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
