//! Configuration types for flashcard extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads, serialise the geometry for
//! logging, and diff two runs to understand why their card crops differ.
//!
//! Physical measurements are in **millimetres**. They are converted to pixel
//! counts per input image (the same settings apply to a 1872 px tablet export
//! and a 2404 px PDF render of the same physical page), so the struct never
//! stores pixel values.

use crate::error::CardSliceError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Side length of one box on the reMarkable "Dots S" template, in mm.
/// Separator search bands default to one box; clearances to half a box.
const DOTS_S_BOX_MM: f64 = 4.80798;

/// Width of the reMarkable toolbar, in mm. The horizontal separator search
/// band starts right of it so toolbar icons are never mistaken for ink.
const RM_TOOLBAR_MM: f64 = 11.72093;

/// Configuration for one extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`], whose defaults are calibrated for
/// reMarkable "Dots S" template exports.
///
/// # Example
/// ```rust
/// use cardslice::{ExtractionConfig, PageTemplate};
///
/// let config = ExtractionConfig::builder()
///     .page_template(PageTemplate::A4Portrait)
///     .black_threshold(160)
///     .switch_front_back(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Physical page width in mm. Default: reMarkable portrait (156.986).
    pub page_width: f64,

    /// Physical page height in mm. Default: reMarkable portrait (209.550).
    ///
    /// This is the anchor for every mm→px conversion; it must match the
    /// physical page the scans were taken from or all clearances and search
    /// bands land in the wrong place.
    pub page_height: f64,

    /// Clearance kept to the separator lines when cutting the grid, in mm.
    /// Default: half a "Dots S" box.
    ///
    /// Shrinks each card box away from the row/column cut lines so the
    /// separator ink itself never ends up inside a card crop.
    pub separator_clearance: f64,

    /// Margin above the page before the separator search begins, in mm.
    /// Default: 0.
    pub margin_top: f64,

    /// Margin on the left before the horizontal separator search band, in mm.
    /// Default: the reMarkable toolbar width.
    pub margin_left: f64,

    /// Height of the vertical-separator search band at the top of each card
    /// row, in mm. Default: one "Dots S" box.
    ///
    /// Only this strip of each row is scanned for the front/back divider, so
    /// handwriting lower in the card cannot masquerade as a separator.
    pub vertical_separator_height: f64,

    /// Width of the horizontal-separator search band, in mm. Default: one
    /// "Dots S" box.
    pub horizontal_separator_width: f64,

    /// Clearance added around detected ink before the final crop, in mm.
    /// Defaults to `separator_clearance` when unset.
    pub card_clearance: Option<f64>,

    /// Grayscale intensity at or below which a pixel counts as ink.
    /// Default: 191 — calibrated for reMarkable templates whose printed
    /// grid lines sit at intensity 192.
    pub black_threshold: u8,

    /// Minimum fraction of ink pixels along a scan line for it to count as
    /// part of a separator band (strictly greater-than). Default: 0.2.
    pub separator_threshold: f64,

    /// Swap front and back of every card in the run. Default: false.
    ///
    /// Applied uniformly after extraction; there is no per-card swap.
    pub switch_front_back: bool,

    /// Maximum rendered dimension (width or height) in pixels when
    /// rasterising PDF or SVG inputs. Default: 2000.
    ///
    /// A safety cap: an A4 page rendered at print resolution could produce
    /// a 7000 px image and quadruple memory use for no detection benefit.
    /// PNG inputs are used at their native size.
    pub max_rendered_pixels: u32,

    /// Number of input images processed concurrently. Default: 4.
    ///
    /// Extraction is CPU-bound, so going past the physical core count buys
    /// nothing. Inputs are independent (no cross-image state), which makes
    /// this safe; output order is by input order regardless.
    pub concurrency: usize,

    /// Name of the exported deck. Default: "Scanned flashcards".
    pub deck_name: String,

    /// Anki deck id. Defaults to a stable hash of `deck_name`, so
    /// re-exporting under the same name updates the same deck.
    pub deck_id: Option<i64>,

    /// Optional per-image progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let (page_width, page_height) = PageTemplate::RemarkablePortrait.dimensions_mm();
        Self {
            page_width,
            page_height,
            separator_clearance: DOTS_S_BOX_MM / 2.0,
            margin_top: 0.0,
            margin_left: RM_TOOLBAR_MM,
            vertical_separator_height: DOTS_S_BOX_MM,
            horizontal_separator_width: DOTS_S_BOX_MM,
            card_clearance: None,
            black_threshold: 191,
            separator_threshold: 0.2,
            switch_front_back: false,
            max_rendered_pixels: 2000,
            concurrency: 4,
            deck_name: "Scanned flashcards".to_string(),
            deck_id: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("page_width", &self.page_width)
            .field("page_height", &self.page_height)
            .field("separator_clearance", &self.separator_clearance)
            .field("margin_top", &self.margin_top)
            .field("margin_left", &self.margin_left)
            .field("vertical_separator_height", &self.vertical_separator_height)
            .field("horizontal_separator_width", &self.horizontal_separator_width)
            .field("card_clearance", &self.card_clearance)
            .field("black_threshold", &self.black_threshold)
            .field("separator_threshold", &self.separator_threshold)
            .field("switch_front_back", &self.switch_front_back)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("concurrency", &self.concurrency)
            .field("deck_name", &self.deck_name)
            .field("deck_id", &self.deck_id)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Effective card clearance in mm: the explicit value, or the separator
    /// clearance when none was set.
    pub fn effective_card_clearance(&self) -> f64 {
        self.card_clearance.unwrap_or(self.separator_clearance)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    /// Set both page dimensions from a standard template.
    pub fn page_template(mut self, template: PageTemplate) -> Self {
        let (w, h) = template.dimensions_mm();
        self.config.page_width = w;
        self.config.page_height = h;
        self
    }

    pub fn page_width(mut self, mm: f64) -> Self {
        self.config.page_width = mm;
        self
    }

    pub fn page_height(mut self, mm: f64) -> Self {
        self.config.page_height = mm;
        self
    }

    pub fn separator_clearance(mut self, mm: f64) -> Self {
        self.config.separator_clearance = mm;
        self
    }

    pub fn margin_top(mut self, mm: f64) -> Self {
        self.config.margin_top = mm;
        self
    }

    pub fn margin_left(mut self, mm: f64) -> Self {
        self.config.margin_left = mm;
        self
    }

    pub fn vertical_separator_height(mut self, mm: f64) -> Self {
        self.config.vertical_separator_height = mm;
        self
    }

    pub fn horizontal_separator_width(mut self, mm: f64) -> Self {
        self.config.horizontal_separator_width = mm;
        self
    }

    pub fn card_clearance(mut self, mm: f64) -> Self {
        self.config.card_clearance = Some(mm);
        self
    }

    pub fn black_threshold(mut self, threshold: u8) -> Self {
        self.config.black_threshold = threshold;
        self
    }

    pub fn separator_threshold(mut self, fraction: f64) -> Self {
        self.config.separator_threshold = fraction;
        self
    }

    pub fn switch_front_back(mut self, v: bool) -> Self {
        self.config.switch_front_back = v;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn deck_name(mut self, name: impl Into<String>) -> Self {
        self.config.deck_name = name.into();
        self
    }

    pub fn deck_id(mut self, id: i64) -> Self {
        self.config.deck_id = Some(id);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Page dimensions are checked here, before any pixel processing: every
    /// mm→px conversion divides by the page height, and a zero or negative
    /// page silently corrupts all downstream geometry.
    pub fn build(self) -> Result<ExtractionConfig, CardSliceError> {
        let c = &self.config;
        if !(c.page_width > 0.0) || !(c.page_height > 0.0) {
            return Err(CardSliceError::InvalidConfig(format!(
                "page dimensions must be positive, got {} × {} mm",
                c.page_width, c.page_height
            )));
        }
        if !(0.0..=1.0).contains(&c.separator_threshold) {
            return Err(CardSliceError::InvalidConfig(format!(
                "separator_threshold must be within 0.0–1.0, got {}",
                c.separator_threshold
            )));
        }
        for (name, value) in [
            ("separator_clearance", c.separator_clearance),
            ("margin_top", c.margin_top),
            ("margin_left", c.margin_left),
            ("vertical_separator_height", c.vertical_separator_height),
            ("horizontal_separator_width", c.horizontal_separator_width),
            ("card_clearance", c.effective_card_clearance()),
        ] {
            if value < 0.0 {
                return Err(CardSliceError::InvalidConfig(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }
        if c.concurrency == 0 {
            return Err(CardSliceError::InvalidConfig(
                "concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Standard physical page sizes, as width × height presets.
///
/// Landscape variants swap the portrait dimensions. Explicit
/// `page_width`/`page_height` values override whichever template was set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageTemplate {
    /// reMarkable tablet, portrait: 156.986 × 209.550 mm. (default)
    #[default]
    RemarkablePortrait,
    /// reMarkable tablet, landscape.
    RemarkableLandscape,
    /// ISO A4, portrait: 210 × 297 mm.
    A4Portrait,
    /// ISO A4, landscape.
    A4Landscape,
    /// US Letter, portrait: 215.9 × 279.4 mm.
    LetterPortrait,
    /// US Letter, landscape.
    LetterLandscape,
}

impl PageTemplate {
    /// Physical (width, height) in millimetres.
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match self {
            PageTemplate::RemarkablePortrait => (156.986, 209.550),
            PageTemplate::RemarkableLandscape => (209.550, 156.986),
            PageTemplate::A4Portrait => (210.0, 297.0),
            PageTemplate::A4Landscape => (297.0, 210.0),
            PageTemplate::LetterPortrait => (215.9, 279.4),
            PageTemplate::LetterLandscape => (279.4, 215.9),
        }
    }
}

/// The closed set of supported input formats, detected from the file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Pdf,
    Svg,
    Png,
}

impl FileType {
    /// Detect the file type from a path's extension.
    ///
    /// Fails explicitly on unrecognized suffixes — guessing a decoder from
    /// file contents would accept inputs the pipeline was never tested on.
    pub fn from_path(path: &Path) -> Result<FileType, CardSliceError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => Ok(FileType::Pdf),
            Some("svg") => Ok(FileType::Svg),
            Some("png") => Ok(FileType::Png),
            _ => Err(CardSliceError::UnsupportedFileType {
                path: path.to_path_buf(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_config_builds() {
        let config = ExtractionConfig::builder().build().expect("valid default");
        assert_eq!(config.black_threshold, 191);
        assert!((config.separator_threshold - 0.2).abs() < 1e-12);
        assert!(!config.switch_front_back);
    }

    #[test]
    fn card_clearance_falls_back_to_separator_clearance() {
        let config = ExtractionConfig::builder()
            .separator_clearance(3.5)
            .build()
            .unwrap();
        assert!((config.effective_card_clearance() - 3.5).abs() < 1e-12);

        let config = ExtractionConfig::builder()
            .separator_clearance(3.5)
            .card_clearance(1.0)
            .build()
            .unwrap();
        assert!((config.effective_card_clearance() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn non_positive_page_height_is_rejected() {
        let err = ExtractionConfig::builder()
            .page_height(0.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, CardSliceError::InvalidConfig(_)));

        let err = ExtractionConfig::builder()
            .page_height(-10.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, CardSliceError::InvalidConfig(_)));
    }

    #[test]
    fn out_of_range_separator_threshold_is_rejected() {
        let err = ExtractionConfig::builder()
            .separator_threshold(1.5)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("separator_threshold"));
    }

    #[test]
    fn negative_clearance_is_rejected() {
        let err = ExtractionConfig::builder()
            .card_clearance(-1.0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("card_clearance"));
    }

    #[test]
    fn landscape_templates_swap_dimensions() {
        let (pw, ph) = PageTemplate::A4Portrait.dimensions_mm();
        let (lw, lh) = PageTemplate::A4Landscape.dimensions_mm();
        assert_eq!((pw, ph), (lh, lw));
    }

    #[test]
    fn file_type_from_suffix() {
        assert_eq!(
            FileType::from_path(&PathBuf::from("scan.png")).unwrap(),
            FileType::Png
        );
        assert_eq!(
            FileType::from_path(&PathBuf::from("notes.PDF")).unwrap(),
            FileType::Pdf
        );
        assert_eq!(
            FileType::from_path(&PathBuf::from("page.Svg")).unwrap(),
            FileType::Svg
        );
        assert!(FileType::from_path(&PathBuf::from("photo.jpeg")).is_err());
        assert!(FileType::from_path(&PathBuf::from("no_extension")).is_err());
    }
}
