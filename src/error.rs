//! Error types for the cardslice library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`CardSliceError`] — **Fatal**: the extraction cannot proceed at all
//!   (missing input file, unsupported file type, invalid configuration).
//!   Returned as `Err(CardSliceError)` from the top-level `extract*`
//!   functions.
//!
//! * [`ImageError`] — **Non-fatal**: a single input scan failed (decode
//!   glitch, a page that does not match the expected card grid) but the
//!   other inputs are fine. Stored inside [`crate::output::ImageReport`] so
//!   callers can inspect partial success rather than losing the whole batch
//!   to one bad scan.
//!
//! Layout violations are detected eagerly at the point of violation and are
//! never papered over: a row with zero or two vertical separators, or a card
//! region with no ink, means the scan does not match the template, and a
//! loud localized failure beats a plausibly-wrong crop.

use crate::geometry::Rectangle;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the cardslice library.
///
/// Per-input failures use [`ImageError`] and are stored in
/// [`crate::output::ImageReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum CardSliceError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file suffix does not name a supported input format.
    #[error("unsupported file type for '{path}': expected .pdf, .svg, or .png")]
    UnsupportedFileType { path: PathBuf },

    /// The file exists and was read, but its contents do not match its
    /// suffix.
    #[error("file does not match its '{extension}' suffix: '{path}'\nFirst bytes: {magic:?}")]
    InvalidFileContents {
        path: PathBuf,
        extension: String,
        magic: [u8; 4],
    },

    /// No input paths were supplied.
    #[error("no input files given")]
    NoInputs,

    // ── Batch errors ──────────────────────────────────────────────────────
    /// Every input failed; there are no cards to hand to the exporter.
    #[error("all {total} input images failed.\nFirst error: {first_error}")]
    AllImagesFailed { total: usize, first_error: String },

    /// A single input failed in a context where partial output is useless
    /// (e.g. layout inspection of exactly that input).
    #[error("failed to process '{path}'")]
    ImageFailed {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write the output deck package.
    #[error("failed to write package '{path}': {detail}")]
    PackageWriteFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single input image.
///
/// Stored alongside [`crate::output::ImageReport`] when an input fails.
/// The overall extraction continues unless ALL inputs fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageError {
    /// Decoding or rasterising the input failed.
    #[error("rasterisation failed: {detail}")]
    RenderFailed { detail: String },

    /// A card row did not contain exactly one vertical separator: the scan
    /// does not match the expected grid template.
    #[error(
        "row {row}: expected exactly one vertical separator, found {n} at columns {found:?}",
        n = .found.len()
    )]
    LayoutMismatch { row: usize, found: Vec<u32> },

    /// A card region contained no ink pixels at all; the configured layout
    /// does not line up with the scan.
    #[error("no ink found in card region {region}")]
    EmptyRegion { region: Rectangle },
}
