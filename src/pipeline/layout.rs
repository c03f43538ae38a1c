//! Grid layout composition: partition a page into card rows and split each
//! row into its front/back halves.
//!
//! The walk is two-level. Horizontal separators are searched only inside a
//! narrow vertical strip (right of the configured left margin) so that
//! handwriting in the cards cannot register as a row boundary; the page top
//! margin and page height are added as synthetic first/last boundaries.
//! Within each row, the front/back divider is searched only inside a short
//! band at the row's top, and there must be exactly one — anything else
//! means the scan does not follow the template and processing aborts rather
//! than guessing which line was meant.

use crate::config::ExtractionConfig;
use crate::error::ImageError;
use crate::geometry::{mm_to_pixels, Rectangle};
use crate::pipeline::separators::{extract_separators, ScanAxis};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The millimetre configuration resolved to pixel counts for one image.
///
/// Resolution depends on the image's pixel height, so two scans of the same
/// physical page at different resolutions get different pixel values from
/// the same [`ExtractionConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelGeometry {
    pub separator_clearance: u32,
    pub card_clearance: u32,
    pub margin_top: u32,
    pub margin_left: u32,
    pub vertical_separator_height: u32,
    pub horizontal_separator_width: u32,
}

impl PixelGeometry {
    /// Convert every physical measurement for an image of the given pixel
    /// height. Ceiling rounding throughout, so clearances are never
    /// under-applied.
    pub fn resolve(config: &ExtractionConfig, image_height_px: u32) -> Self {
        let px = |mm: f64| mm_to_pixels(mm, config.page_height, image_height_px);
        Self {
            separator_clearance: px(config.separator_clearance),
            card_clearance: px(config.effective_card_clearance()),
            margin_top: px(config.margin_top),
            margin_left: px(config.margin_left),
            vertical_separator_height: px(config.vertical_separator_height),
            horizontal_separator_width: px(config.horizontal_separator_width),
        }
    }
}

/// The raw grid cell pair for one card row, before content tightening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardBox {
    pub front: Rectangle,
    pub back: Rectangle,
}

/// Everything the layout pass detected on one page.
///
/// `boxes` drives the pipeline; the bands and boundaries are kept for
/// diagnostics (serialise them to see where detection went looking).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridLayout {
    /// The strip scanned for horizontal (row) separators.
    pub horizontal_band: Rectangle,
    /// Row cut lines including the synthetic top margin and page height;
    /// each consecutive pair delimits one card row.
    pub row_boundaries: Vec<u32>,
    /// The strip scanned for the front/back divider, per row.
    pub vertical_bands: Vec<Rectangle>,
    /// The divider column found in each row.
    pub vertical_separators: Vec<u32>,
    /// One front/back cell pair per row, top-to-bottom.
    pub boxes: Vec<CardBox>,
}

/// Partition a grayscale page into front/back card boxes.
///
/// Errors with [`ImageError::LayoutMismatch`] when any row does not contain
/// exactly one vertical separator; no boxes are returned for a page that
/// violates the template.
pub fn compose_grid(
    matrix: &GrayImage,
    geometry: &PixelGeometry,
    config: &ExtractionConfig,
) -> Result<GridLayout, ImageError> {
    let width = matrix.width();
    let height = matrix.height();

    let band_x1 = geometry.margin_left.min(width);
    let band_x2 = (geometry.margin_left + geometry.horizontal_separator_width).min(width);
    let horizontal_band = Rectangle::new(band_x1, band_x2, 0, height);

    let mut row_boundaries = vec![geometry.margin_top.min(height)];
    row_boundaries.extend(extract_separators(
        matrix,
        horizontal_band,
        ScanAxis::Rows,
        config,
    ));
    row_boundaries.push(height);
    debug!(
        rows = row_boundaries.len() - 1,
        "horizontal separator search complete"
    );

    let clearance = geometry.separator_clearance;
    let mut vertical_bands = Vec::new();
    let mut vertical_separators = Vec::new();
    let mut boxes = Vec::new();

    for (row, pair) in row_boundaries.windows(2).enumerate() {
        let (y, y_next) = (pair[0], pair[1].max(pair[0]));

        let band_y2 = (y + geometry.vertical_separator_height).min(height).max(y);
        let vertical_band = Rectangle::new(0, width, y, band_y2);
        let found = extract_separators(matrix, vertical_band, ScanAxis::Columns, config);
        if found.len() != 1 {
            return Err(ImageError::LayoutMismatch { row, found });
        }
        let separator = found[0];

        let top = (y + clearance).min(y_next);
        let bottom = y_next.saturating_sub(clearance).max(top);
        let front_x2 = separator.saturating_sub(clearance);
        let back_x1 = (separator + clearance).min(width);
        boxes.push(CardBox {
            front: Rectangle::new(0, front_x2, top, bottom),
            back: Rectangle::new(back_x1, width.max(back_x1), top, bottom),
        });
        vertical_bands.push(vertical_band);
        vertical_separators.push(separator);
    }

    Ok(GridLayout {
        horizontal_band,
        row_boundaries,
        vertical_bands,
        vertical_separators,
        boxes,
    })
}
