//! Result types returned by the extraction entry points.

use crate::error::ImageError;
use crate::pipeline::bounds::CardBoundary;
use crate::pipeline::layout::GridLayout;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One extracted card: an ordered pair of cropped images.
///
/// Constructed once per refined card boundary and immutable afterwards;
/// the crops keep the source image's colour, only the grayscale working
/// copy is thresholded.
#[derive(Clone)]
pub struct Flashcard {
    /// The question side (left half of the card row, unless swapped).
    pub front: DynamicImage,
    /// The answer side.
    pub back: DynamicImage,
}

impl Flashcard {
    pub fn new(front: DynamicImage, back: DynamicImage) -> Self {
        Self { front, back }
    }

    /// The same card with front and back exchanged.
    pub fn switched(self) -> Self {
        Self {
            front: self.back,
            back: self.front,
        }
    }
}

impl fmt::Debug for Flashcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flashcard")
            .field(
                "front",
                &format_args!("{}×{}", self.front.width(), self.front.height()),
            )
            .field(
                "back",
                &format_args!("{}×{}", self.back.width(), self.back.height()),
            )
            .finish()
    }
}

/// Per-input outcome, kept for every input whether it succeeded or failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageReport {
    /// Position in the input list (0-indexed). Deck order follows this.
    pub index: usize,
    /// The input file.
    pub path: PathBuf,
    /// Raster pages the input decoded into (1 for PNG/SVG, the page count
    /// for PDF).
    pub pages: usize,
    /// Cards extracted from this input.
    pub cards: usize,
    /// The failure, if the input failed. A failed input contributes no
    /// cards at all — partial rows are never emitted.
    pub error: Option<ImageError>,
    /// Wall-clock processing time for this input.
    pub duration_ms: u64,
}

/// Aggregate counters for one extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total_images: usize,
    pub processed_images: usize,
    pub failed_images: usize,
    pub total_cards: usize,
    pub total_duration_ms: u64,
}

/// Everything an extraction run produced.
///
/// `flashcards` is the deck order: inputs in the order supplied, pages in
/// document order, cards top-to-bottom within a page.
pub struct ExtractionOutput {
    pub flashcards: Vec<Flashcard>,
    pub reports: Vec<ImageReport>,
    pub stats: ExtractionStats,
}

impl fmt::Debug for ExtractionOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionOutput")
            .field("flashcards", &self.flashcards.len())
            .field("reports", &self.reports)
            .field("stats", &self.stats)
            .finish()
    }
}

/// The detected layout of one raster page, for diagnostics.
///
/// Produced by [`crate::extract::inspect`] without cropping or exporting
/// anything; serialise it to see exactly where the pipeline found
/// separators and card boundaries on a scan that misbehaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    /// Page number within the input (0-indexed; always 0 for PNG/SVG).
    pub page: usize,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Search bands, row boundaries, and raw card boxes.
    pub grid: GridLayout,
    /// Content-tightened, clearance-expanded crop rectangles per card.
    pub boundaries: Vec<CardBoundary>,
}
