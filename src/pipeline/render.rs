//! Rasterisation: decode an input file into one `DynamicImage` per page.
//!
//! PNG scans are used at their native resolution — they carry the pixel
//! density the tablet or scanner produced, and resampling would only blur
//! the separator lines the detector depends on. PDF and SVG have no native
//! raster resolution, so they are rendered with the longest edge capped at
//! `max_rendered_pixels`; the physical-unit geometry adapts to whatever
//! pixel height comes out.
//!
//! Everything here is CPU-bound and blocking; the orchestrator calls it
//! from `spawn_blocking`.

use crate::config::FileType;
use crate::error::ImageError;
use crate::pipeline::input::ResolvedInput;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Decode an input into raster pages.
///
/// PNG and SVG yield exactly one page; a PDF yields one per document page,
/// in document order.
pub fn render_input(
    input: &ResolvedInput,
    max_rendered_pixels: u32,
) -> Result<Vec<DynamicImage>, ImageError> {
    match input.file_type {
        FileType::Png => render_png(&input.path).map(|img| vec![img]),
        FileType::Svg => render_svg(&input.path, max_rendered_pixels).map(|img| vec![img]),
        FileType::Pdf => render_pdf(&input.path, max_rendered_pixels),
    }
}

fn render_png(path: &Path) -> Result<DynamicImage, ImageError> {
    let img = image::open(path).map_err(|e| ImageError::RenderFailed {
        detail: format!("PNG decode: {e}"),
    })?;
    debug!(
        "decoded {} → {}×{} px",
        path.display(),
        img.width(),
        img.height()
    );
    Ok(img)
}

fn render_pdf(path: &Path, max_pixels: u32) -> Result<Vec<DynamicImage>, ImageError> {
    let pdfium = Pdfium::default();

    let document =
        pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| ImageError::RenderFailed {
                detail: format!("PDF open: {e:?}"),
            })?;

    let pages = document.pages();
    let total = pages.len() as usize;
    debug!("PDF loaded: {} pages", total);

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut results = Vec::with_capacity(total);
    for idx in 0..total {
        let page = pages
            .get(idx as u16)
            .map_err(|e| ImageError::RenderFailed {
                detail: format!("PDF page {}: {e:?}", idx + 1),
            })?;
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| ImageError::RenderFailed {
                detail: format!("PDF page {} rasterisation: {e:?}", idx + 1),
            })?;
        let img = bitmap.as_image();
        debug!("rendered page {} → {}×{} px", idx + 1, img.width(), img.height());
        results.push(img);
    }

    Ok(results)
}

fn render_svg(path: &Path, max_pixels: u32) -> Result<DynamicImage, ImageError> {
    let data = std::fs::read(path).map_err(|e| ImageError::RenderFailed {
        detail: format!("SVG read: {e}"),
    })?;
    let tree = resvg::usvg::Tree::from_data(&data, &resvg::usvg::Options::default()).map_err(
        |e| ImageError::RenderFailed {
            detail: format!("SVG parse: {e}"),
        },
    )?;

    let size = tree.size();
    let longest = size.width().max(size.height());
    if longest <= 0.0 {
        return Err(ImageError::RenderFailed {
            detail: "SVG has zero size".to_string(),
        });
    }
    let scale = max_pixels as f32 / longest;
    let width = (size.width() * scale).round().max(1.0) as u32;
    let height = (size.height() * scale).round().max(1.0) as u32;

    let mut pixmap =
        resvg::tiny_skia::Pixmap::new(width, height).ok_or_else(|| ImageError::RenderFailed {
            detail: format!("could not allocate {width}×{height} pixmap"),
        })?;
    // SVG pages are transparent by default; card detection needs paper.
    pixmap.fill(resvg::tiny_skia::Color::WHITE);
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let png = pixmap.encode_png().map_err(|e| ImageError::RenderFailed {
        detail: format!("SVG pixmap encode: {e}"),
    })?;
    let img = image::load_from_memory(&png).map_err(|e| ImageError::RenderFailed {
        detail: format!("SVG raster decode: {e}"),
    })?;
    debug!(
        "rendered {} → {}×{} px",
        path.display(),
        img.width(),
        img.height()
    );
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::input::resolve_input;

    #[test]
    fn png_renders_at_native_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        image::GrayImage::from_pixel(32, 48, image::Luma([255]))
            .save(&path)
            .unwrap();

        let input = resolve_input(&path).unwrap();
        let pages = render_input(&input, 2000).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!((pages[0].width(), pages[0].height()), (32, 48));
    }

    #[test]
    fn svg_renders_capped_to_the_longest_edge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.svg");
        std::fs::write(
            &path,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="200">
                 <rect x="10" y="10" width="80" height="40" fill="black"/>
               </svg>"#,
        )
        .unwrap();

        let input = resolve_input(&path).unwrap();
        let pages = render_input(&input, 400).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!((pages[0].width(), pages[0].height()), (200, 400));
    }

    #[test]
    fn corrupt_svg_is_a_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.svg");
        std::fs::write(&path, "<svg this is not xml").unwrap();

        let input = resolve_input(&path).unwrap();
        let err = render_input(&input, 400).unwrap_err();
        assert!(matches!(err, ImageError::RenderFailed { .. }));
    }
}
