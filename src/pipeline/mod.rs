//! Pipeline stages for scan-to-flashcard extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping the
//! stages separate makes each independently testable and lets us swap the
//! rasterisation backend without touching the layout code.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ separators ──▶ layout ──▶ bounds ──▶ crop
//! (path)   (raster)   (ink bands)    (grid)     (tighten)  (cards)
//! ```
//!
//! 1. [`input`]      — validate the user-supplied path and detect the format
//! 2. [`render`]     — decode PDF/SVG/PNG into raster pages; runs in
//!    `spawn_blocking` because decoding is CPU-bound
//! 3. [`separators`] — locate high-ink-density bands along one axis of a
//!    grayscale region and collapse each band to its centre line
//! 4. [`layout`]     — walk the page top-to-bottom into card rows and split
//!    each row at its single vertical separator
//! 5. [`bounds`]     — tighten every card box to its actual ink content,
//!    with clearance, clipped to the cell

pub mod bounds;
pub mod input;
pub mod layout;
pub mod render;
pub mod separators;
