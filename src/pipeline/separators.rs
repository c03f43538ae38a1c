//! Separator band detection: find printed dividing lines by ink density.
//!
//! A separator on a scanned template is never a crisp one-pixel line — pen
//! strokes wobble, anti-aliasing smears the line over several rows, and the
//! template's own printed grid adds faint noise. So instead of edge
//! detection, each line across the scan axis is classified by the *fraction*
//! of its pixels that are ink, and contiguous runs of high-density lines are
//! collapsed to a single centre coordinate.

use crate::config::ExtractionConfig;
use crate::geometry::Rectangle;
use image::GrayImage;

/// Which axis the separator scan walks along.
///
/// An explicit two-valued mode rather than a numeric axis index; transposing
/// rows and columns by accident is the classic bug in this kind of code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanAxis {
    /// Walk rows top-to-bottom; separators are horizontal lines.
    Rows,
    /// Walk columns left-to-right; separators are vertical lines.
    Columns,
}

/// Locate separator band centres within `region` of a grayscale matrix.
///
/// For each index along the scan axis, the fraction of pixels along the
/// orthogonal axis with intensity at or below `black_threshold` is compared
/// (strictly greater-than) against `separator_threshold`. Contiguous runs of
/// qualifying indices form one band each and collapse to the run's mean
/// index, rounded half away from zero.
///
/// Returns strictly increasing coordinates in **full-image** space (not
/// relative to `region`). An empty region or a region with no band yields an
/// empty vector — a valid result, not an error. A pure function: identical
/// inputs always produce the identical sequence.
pub fn extract_separators(
    matrix: &GrayImage,
    region: Rectangle,
    axis: ScanAxis,
    config: &ExtractionConfig,
) -> Vec<u32> {
    let full = Rectangle::new(0, matrix.width(), 0, matrix.height());
    let region = region.clipped_to(full);
    if region.is_empty() {
        return Vec::new();
    }

    let (scan_start, scan_end, ortho_start, ortho_end) = match axis {
        ScanAxis::Rows => (region.y1, region.y2, region.x1, region.x2),
        ScanAxis::Columns => (region.x1, region.x2, region.y1, region.y2),
    };
    let ortho_len = f64::from(ortho_end - ortho_start);

    let mut centres = Vec::new();
    let mut current_run: Option<(u32, u32)> = None;

    for i in scan_start..scan_end {
        let ink = (ortho_start..ortho_end)
            .filter(|&j| {
                let (x, y) = match axis {
                    ScanAxis::Rows => (j, i),
                    ScanAxis::Columns => (i, j),
                };
                matrix.get_pixel(x, y)[0] <= config.black_threshold
            })
            .count();
        let is_separator = ink as f64 / ortho_len > config.separator_threshold;

        if is_separator {
            current_run = match current_run {
                Some((first, _)) => Some((first, i)),
                None => Some((i, i)),
            };
        } else if let Some((first, last)) = current_run.take() {
            centres.push(run_centre(first, last));
        }
    }
    // Close any run still open at the end of the scan axis.
    if let Some((first, last)) = current_run {
        centres.push(run_centre(first, last));
    }

    centres
}

/// Mean of the inclusive index run `first..=last`, rounded half away from
/// zero. A single isolated index is its own run and comes back unchanged.
fn run_centre(first: u32, last: u32) -> u32 {
    ((f64::from(first) + f64::from(last)) / 2.0).round() as u32
}
