//! Pixel-space rectangles and physical-unit conversion.
//!
//! Everything downstream of image decoding works in integer pixel
//! coordinates, but the configuration is expressed in millimetres so the
//! same settings apply to scans of any resolution. The conversion is
//! anchored on the page height: a 209.55 mm reMarkable page scanned at
//! 1872 px and the same page rendered from PDF at 2404 px get different
//! pixel offsets from identical millimetre settings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An axis-aligned rectangle in pixel coordinates.
///
/// `x1..x2` spans columns, `y1..y2` spans rows; `x2`/`y2` are exclusive for
/// cropping purposes (`width = x2 - x1`). Rectangles are immutable value
/// objects — every operation returns a new one.
///
/// Invariant: `x1 <= x2` and `y1 <= y2`. Degenerate (zero-area) rectangles
/// can occur as intermediate clipped values; they are never a valid final
/// card boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    pub x1: u32,
    pub x2: u32,
    pub y1: u32,
    pub y2: u32,
}

impl Rectangle {
    /// Create a rectangle from its edges.
    pub fn new(x1: u32, x2: u32, y1: u32, y2: u32) -> Self {
        debug_assert!(x1 <= x2, "rectangle x1 {x1} > x2 {x2}");
        debug_assert!(y1 <= y2, "rectangle y1 {y1} > y2 {y2}");
        Self { x1, x2, y1, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// True if the rectangle encloses zero pixels on either axis.
    pub fn is_empty(&self) -> bool {
        self.x1 == self.x2 || self.y1 == self.y2
    }

    /// The rectangle shifted by `(dx, dy)`.
    ///
    /// Used to re-anchor a rectangle computed relative to a cropped
    /// sub-matrix back into full-image coordinates.
    pub fn translated(&self, dx: u32, dy: u32) -> Self {
        Self {
            x1: self.x1 + dx,
            x2: self.x2 + dx,
            y1: self.y1 + dy,
            y2: self.y2 + dy,
        }
    }

    /// The rectangle grown outward by `amount` on all four sides,
    /// saturating at the image origin.
    pub fn expanded(&self, amount: u32) -> Self {
        Self {
            x1: self.x1.saturating_sub(amount),
            x2: self.x2 + amount,
            y1: self.y1.saturating_sub(amount),
            y2: self.y2 + amount,
        }
    }

    /// The intersection of this rectangle with `bounds`.
    ///
    /// Edges are clamped with `max`/`min` against the bounds' own edges, so
    /// the result never exceeds `bounds` on any side. A rectangle entirely
    /// outside `bounds` collapses to a degenerate rectangle on the nearest
    /// edge rather than inverting.
    pub fn clipped_to(&self, bounds: Rectangle) -> Self {
        let x1 = self.x1.clamp(bounds.x1, bounds.x2);
        let x2 = self.x2.clamp(bounds.x1, bounds.x2);
        let y1 = self.y1.clamp(bounds.y1, bounds.y2);
        let y2 = self.y2.clamp(bounds.y1, bounds.y2);
        Self {
            x1,
            x2: x2.max(x1),
            y1,
            y2: y2.max(y1),
        }
    }

    /// True if `other` lies entirely within this rectangle.
    pub fn contains(&self, other: Rectangle) -> bool {
        self.x1 <= other.x1 && other.x2 <= self.x2 && self.y1 <= other.y1 && other.y2 <= self.y2
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}..{})×[{}..{})",
            self.x1, self.x2, self.y1, self.y2
        )
    }
}

/// Convert a physical length to a pixel count for a given image.
///
/// Always rounds **up**, so clearances and margins are never under-applied
/// on low-resolution scans.
///
/// Precondition: `page_height_mm > 0` — enforced by
/// [`crate::config::ExtractionConfigBuilder::build`] before any pixel
/// processing starts.
pub fn mm_to_pixels(value_mm: f64, page_height_mm: f64, image_height_px: u32) -> u32 {
    debug_assert!(page_height_mm > 0.0, "page height must be positive");
    (value_mm / page_height_mm * f64::from(image_height_px)).ceil() as u32
}

/// Inverse of [`mm_to_pixels`], without rounding.
///
/// Only used for diagnostics and display; the pipeline itself never converts
/// back to millimetres.
pub fn pixels_to_mm(value_px: f64, page_height_mm: f64, image_height_px: u32) -> f64 {
    debug_assert!(image_height_px > 0, "image height must be positive");
    value_px / f64::from(image_height_px) * page_height_mm
}
