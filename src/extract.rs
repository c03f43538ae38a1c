//! Extraction entry points.
//!
//! ## Why async entry over a pure-sync API?
//!
//! The per-image pipeline itself is synchronous and pure — matrices, boxes,
//! and boundaries never outlive the image they were computed from. But
//! inputs are completely independent of one another, so the batch level is
//! where parallelism belongs: each input is decoded and sliced inside
//! `spawn_blocking` and up to `config.concurrency` inputs run at once.
//! [`extract_sync`] wraps a private runtime for callers without one.

use crate::config::ExtractionConfig;
use crate::error::{CardSliceError, ImageError};
use crate::export;
use crate::output::{ExtractionOutput, ExtractionStats, Flashcard, ImageReport, PageLayout};
use crate::pipeline::input::{resolve_input, ResolvedInput};
use crate::pipeline::layout::PixelGeometry;
use crate::pipeline::{bounds, layout, render};
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract flashcards from a batch of scan files.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `inputs` — scan files (PDF, SVG, or PNG), in deck order
/// * `config` — extraction configuration
///
/// # Returns
/// `Ok(ExtractionOutput)` on success, even if some inputs failed
/// (check `output.stats.failed_images` and the per-input reports).
/// Flashcards are ordered by input, then page, then row; a failed input
/// contributes no cards and no partial rows.
///
/// # Errors
/// Returns `Err(CardSliceError)` only for fatal errors:
/// - Empty input list, missing file, unreadable file
/// - Unsupported file type or contents not matching the suffix
/// - Every input failed and there is nothing to export
pub async fn extract(
    inputs: &[PathBuf],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, CardSliceError> {
    let total_start = Instant::now();
    if inputs.is_empty() {
        return Err(CardSliceError::NoInputs);
    }
    info!("starting extraction of {} input(s)", inputs.len());

    // ── Step 1: Resolve all inputs before any pixel work ─────────────────
    // A typo'd path or a mislabeled file fails the run immediately instead
    // of surfacing halfway through the batch.
    let resolved: Vec<ResolvedInput> = inputs
        .iter()
        .map(|p| resolve_input(p))
        .collect::<Result<_, _>>()?;

    let total = resolved.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    // ── Step 2: Process inputs concurrently ──────────────────────────────
    let mut processed: Vec<ProcessedInput> = stream::iter(resolved.into_iter().enumerate().map(
        |(index, input)| {
            let config = config.clone();
            async move {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_image_start(index + 1, total);
                }
                let start = Instant::now();
                let path = input.path.clone();
                let result = tokio::task::spawn_blocking({
                    let config = config.clone();
                    move || process_input_blocking(&input, &config)
                })
                .await
                .unwrap_or_else(|e| {
                    Err(ImageError::RenderFailed {
                        detail: format!("worker panicked: {e}"),
                    })
                });
                let duration_ms = start.elapsed().as_millis() as u64;

                let (pages, cards, error) = match result {
                    Ok((pages, cards)) => (pages, cards, None),
                    Err(e) => (0, Vec::new(), Some(e)),
                };
                if let Some(ref cb) = config.progress_callback {
                    match error {
                        None => cb.on_image_complete(index + 1, total, cards.len()),
                        Some(ref e) => cb.on_image_error(index + 1, total, e.to_string()),
                    }
                }
                ProcessedInput {
                    index,
                    path,
                    pages,
                    cards,
                    error,
                    duration_ms,
                }
            }
        },
    ))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    // Deck order is input order regardless of which worker finished first.
    processed.sort_by_key(|p| p.index);

    // ── Step 3: Assemble output ──────────────────────────────────────────
    let mut flashcards = Vec::new();
    let mut reports = Vec::with_capacity(processed.len());
    for p in processed {
        if let Some(ref e) = p.error {
            warn!("input {} failed: {e}", p.path.display());
        }
        reports.push(ImageReport {
            index: p.index,
            path: p.path,
            pages: p.pages,
            cards: p.cards.len(),
            error: p.error,
            duration_ms: p.duration_ms,
        });
        flashcards.extend(p.cards);
    }

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    let succeeded = total - failed;
    if succeeded == 0 {
        let first_error = reports
            .iter()
            .find_map(|r| r.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(CardSliceError::AllImagesFailed { total, first_error });
    }

    // ── Step 4: Apply the global front/back swap ─────────────────────────
    if config.switch_front_back {
        flashcards = flashcards.into_iter().map(Flashcard::switched).collect();
    }

    let stats = ExtractionStats {
        total_images: total,
        processed_images: succeeded,
        failed_images: failed,
        total_cards: flashcards.len(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "extraction complete: {} card(s) from {}/{} input(s) in {}ms",
        stats.total_cards, succeeded, total, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }

    Ok(ExtractionOutput {
        flashcards,
        reports,
        stats,
    })
}

/// Extract flashcards and write them to an Anki package in one call.
///
/// The package write is atomic at the file level (temp file + rename inside
/// the exporter), so a crash never leaves a truncated `.apkg` behind.
pub async fn extract_to_package(
    inputs: &[PathBuf],
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, CardSliceError> {
    let output = extract(inputs, config).await?;
    let path = output_path.as_ref().to_path_buf();
    let config = config.clone();

    // genanki and the media staging are blocking file I/O; the extracted
    // images move into the worker and come back with the result.
    let output = tokio::task::spawn_blocking(move || -> Result<_, CardSliceError> {
        export::write_package(&output.flashcards, &config, &path)?;
        Ok(output)
    })
    .await
    .map_err(|e| CardSliceError::Internal(format!("export task panicked: {e}")))??;

    Ok(output)
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    inputs: &[PathBuf],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, CardSliceError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CardSliceError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(extract(inputs, config))
}

/// Detect the layout of a single input without cropping or exporting.
///
/// Returns one [`PageLayout`] per raster page: search bands, row
/// boundaries, raw card boxes, and refined boundaries. Unlike [`extract`],
/// a layout violation here is a fatal error — inspecting exactly the scan
/// that fails is the point.
pub async fn inspect(
    input: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<Vec<PageLayout>, CardSliceError> {
    let resolved = resolve_input(input.as_ref())?;
    let config = config.clone();

    tokio::task::spawn_blocking(move || {
        let path = resolved.path.clone();
        inspect_blocking(&resolved, &config)
            .map_err(|source| CardSliceError::ImageFailed { path, source })
    })
    .await
    .map_err(|e| CardSliceError::Internal(format!("inspect task panicked: {e}")))?
}

// ── Internal helpers ─────────────────────────────────────────────────────

struct ProcessedInput {
    index: usize,
    path: PathBuf,
    pages: usize,
    cards: Vec<Flashcard>,
    error: Option<ImageError>,
    duration_ms: u64,
}

/// Decode one input and slice every page of it into flashcards.
fn process_input_blocking(
    input: &ResolvedInput,
    config: &ExtractionConfig,
) -> Result<(usize, Vec<Flashcard>), ImageError> {
    let pages = render::render_input(input, config.max_rendered_pixels)?;
    let page_count = pages.len();

    let mut cards = Vec::new();
    for (page_idx, page) in pages.iter().enumerate() {
        let page_cards = process_page(page, config)?;
        debug!(
            "{} page {}: {} card(s)",
            input.path.display(),
            page_idx + 1,
            page_cards.len()
        );
        cards.extend(page_cards);
    }
    Ok((page_count, cards))
}

/// Slice one raster page: grayscale → grid → refine → crop.
///
/// Crops are taken from the original (colour) image; the grayscale matrix
/// exists only for detection.
fn process_page(
    page: &DynamicImage,
    config: &ExtractionConfig,
) -> Result<Vec<Flashcard>, ImageError> {
    let matrix = page.to_luma8();
    let geometry = PixelGeometry::resolve(config, matrix.height());
    let grid = layout::compose_grid(&matrix, &geometry, config)?;

    let mut cards = Vec::with_capacity(grid.boxes.len());
    for card_box in &grid.boxes {
        let boundary = bounds::refine_card_box(&matrix, card_box, geometry.card_clearance, config)?;
        let front = crop(page, boundary.front);
        let back = crop(page, boundary.back);
        cards.push(Flashcard::new(front, back));
    }
    Ok(cards)
}

fn crop(page: &DynamicImage, r: crate::geometry::Rectangle) -> DynamicImage {
    page.crop_imm(r.x1, r.y1, r.width(), r.height())
}

fn inspect_blocking(
    input: &ResolvedInput,
    config: &ExtractionConfig,
) -> Result<Vec<PageLayout>, ImageError> {
    let pages = render::render_input(input, config.max_rendered_pixels)?;

    let mut layouts = Vec::with_capacity(pages.len());
    for (page_idx, page) in pages.iter().enumerate() {
        let matrix = page.to_luma8();
        let geometry = PixelGeometry::resolve(config, matrix.height());
        let grid = layout::compose_grid(&matrix, &geometry, config)?;
        let boundaries = grid
            .boxes
            .iter()
            .map(|b| bounds::refine_card_box(&matrix, b, geometry.card_clearance, config))
            .collect::<Result<Vec<_>, _>>()?;
        layouts.push(PageLayout {
            page: page_idx,
            width: matrix.width(),
            height: matrix.height(),
            grid,
            boundaries,
        });
    }
    Ok(layouts)
}
