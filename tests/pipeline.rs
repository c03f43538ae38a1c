//! End-to-end pipeline tests against synthetic scans.
//!
//! Every test builds its page in memory with the `image` crate and writes it
//! to a temp directory, so the suite is fully hermetic: no fixtures, no
//! network, no tablet required. Pages use a 1 mm = 1 px trick — the
//! configured physical page height equals the raster height in pixels — so
//! millimetre settings can be asserted against exact pixel coordinates.

use cardslice::{
    extract, extract_to_package, inspect, CardSliceError, ExtractionConfig, ImageError,
};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

// ── Test helpers ─────────────────────────────────────────────────────────────

/// A synthetic template page: 1-px horizontal rules at `rules`, a full-height
/// vertical divider, and one 30×30 ink blob per card half (30 px in from the
/// cell's left edge, 30 px down from its top rule).
fn grid_scan(width: u32, height: u32, rules: &[u32], divider: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, WHITE);
    for &y in rules {
        for x in 0..width {
            img.put_pixel(x, y, BLACK);
        }
    }
    for y in 0..height {
        img.put_pixel(divider, y, BLACK);
    }

    let mut boundaries = vec![0];
    boundaries.extend_from_slice(rules);
    boundaries.push(height);
    for pair in boundaries.windows(2) {
        let y = pair[0];
        for (x0, y0) in [(30, y + 30), (divider + 30, y + 30)] {
            for dy in 0..30 {
                for dx in 0..30 {
                    img.put_pixel(x0 + dx, y0 + dy, BLACK);
                }
            }
        }
    }
    img
}

fn save_png(dir: &Path, name: &str, img: &RgbaImage) -> PathBuf {
    let path = dir.join(name);
    img.save(&path).expect("write synthetic scan");
    path
}

/// Config using the 1 mm = 1 px identity for a page of `page_px` height:
/// margins zero, 5 px clearances, 10 px search bands.
fn test_config(page_px: u32) -> ExtractionConfig {
    ExtractionConfig::builder()
        .page_width(f64::from(page_px))
        .page_height(f64::from(page_px))
        .separator_clearance(5.0)
        .card_clearance(5.0)
        .margin_top(0.0)
        .margin_left(0.0)
        .vertical_separator_height(10.0)
        .horizontal_separator_width(10.0)
        .black_threshold(191)
        .separator_threshold(0.2)
        .build()
        .expect("valid test config")
}

// ── End-to-end extraction ────────────────────────────────────────────────────

#[tokio::test]
async fn three_row_page_yields_three_cards() {
    let dir = TempDir::new().unwrap();
    let scan = grid_scan(300, 300, &[100, 200], 150);
    let path = save_png(dir.path(), "page.png", &scan);

    let output = extract(&[path], &test_config(300)).await.expect("extraction succeeds");

    assert_eq!(output.stats.total_images, 1);
    assert_eq!(output.stats.failed_images, 0);
    assert_eq!(output.flashcards.len(), 3, "one card per row");

    // Each blob spans 30 px; with 5 px clearance on all sides the crop is
    // 30 + 2·5 - 1 = 39 px square (the tight box ends on the last ink
    // column).
    for card in &output.flashcards {
        assert_eq!((card.front.width(), card.front.height()), (39, 39));
        assert_eq!((card.back.width(), card.back.height()), (39, 39));
    }
}

#[tokio::test]
async fn detected_layout_matches_the_synthetic_grid() {
    let dir = TempDir::new().unwrap();
    let scan = grid_scan(300, 300, &[100, 200], 150);
    let path = save_png(dir.path(), "page.png", &scan);

    let pages = inspect(&path, &test_config(300)).await.expect("inspection succeeds");
    assert_eq!(pages.len(), 1);
    let page = &pages[0];

    assert_eq!((page.width, page.height), (300, 300));
    assert_eq!(page.grid.row_boundaries, vec![0, 100, 200, 300]);
    assert_eq!(page.grid.vertical_separators, vec![150, 150, 150]);
    assert_eq!(page.boundaries.len(), 3);

    // Clipping invariant: every refined boundary stays inside its cell.
    for (card_box, boundary) in page.grid.boxes.iter().zip(&page.boundaries) {
        assert!(
            card_box.front.contains(boundary.front),
            "front boundary {} escapes its cell {}",
            boundary.front,
            card_box.front
        );
        assert!(
            card_box.back.contains(boundary.back),
            "back boundary {} escapes its cell {}",
            boundary.back,
            card_box.back
        );
    }

    // Exact boundary for the first row: blob at (30..59, 30..59), expanded
    // by the 5 px card clearance.
    assert_eq!(page.boundaries[0].front.x1, 25);
    assert_eq!(page.boundaries[0].front.x2, 64);
    assert_eq!(page.boundaries[0].front.y1, 25);
    assert_eq!(page.boundaries[0].front.y2, 64);
}

#[tokio::test]
async fn n_separator_bands_yield_n_plus_one_card_rows() {
    let dir = TempDir::new().unwrap();
    let scan = grid_scan(300, 500, &[100, 200, 300, 400], 150);
    let path = save_png(dir.path(), "page.png", &scan);

    let output = extract(&[path], &test_config(500)).await.expect("extraction succeeds");
    assert_eq!(output.flashcards.len(), 5);
    assert_eq!(output.reports[0].cards, 5);
}

#[tokio::test]
async fn global_swap_exchanges_front_and_back() {
    let dir = TempDir::new().unwrap();
    let scan = grid_scan(300, 300, &[100], 150);
    let path = save_png(dir.path(), "page.png", &scan);

    let plain = extract(&[path.clone()], &test_config(300)).await.unwrap();

    let mut swapped_config = test_config(300);
    swapped_config.switch_front_back = true;
    let swapped = extract(&[path], &swapped_config).await.unwrap();

    assert_eq!(plain.flashcards.len(), swapped.flashcards.len());
    for (a, b) in plain.flashcards.iter().zip(&swapped.flashcards) {
        assert_eq!(
            a.front.to_rgba8().into_raw(),
            b.back.to_rgba8().into_raw(),
            "swapped back must equal original front"
        );
        assert_eq!(a.back.to_rgba8().into_raw(), b.front.to_rgba8().into_raw());
    }
}

#[tokio::test]
async fn extraction_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let scan = grid_scan(300, 300, &[100, 200], 150);
    let path = save_png(dir.path(), "page.png", &scan);
    let config = test_config(300);

    let first = extract(&[path.clone()], &config).await.unwrap();
    let second = extract(&[path], &config).await.unwrap();

    assert_eq!(first.flashcards.len(), second.flashcards.len());
    for (a, b) in first.flashcards.iter().zip(&second.flashcards) {
        assert_eq!(a.front.to_rgba8().into_raw(), b.front.to_rgba8().into_raw());
        assert_eq!(a.back.to_rgba8().into_raw(), b.back.to_rgba8().into_raw());
    }
}

// ── Batch failure policy ─────────────────────────────────────────────────────

/// A page whose single row contains two vertical dividers — a template
/// violation that must fail that scan, not pick one divider silently.
fn double_divider_scan() -> RgbaImage {
    let mut img = RgbaImage::from_pixel(300, 300, WHITE);
    for y in 0..300 {
        img.put_pixel(100, y, BLACK);
        img.put_pixel(200, y, BLACK);
    }
    img
}

#[tokio::test]
async fn one_bad_scan_does_not_sink_the_batch() {
    let dir = TempDir::new().unwrap();
    let good = save_png(dir.path(), "good.png", &grid_scan(300, 300, &[100, 200], 150));
    let bad = save_png(dir.path(), "bad.png", &double_divider_scan());

    let output = extract(&[good, bad], &test_config(300)).await.expect("batch succeeds partially");

    assert_eq!(output.stats.total_images, 2);
    assert_eq!(output.stats.processed_images, 1);
    assert_eq!(output.stats.failed_images, 1);
    assert_eq!(output.flashcards.len(), 3, "only the good scan's cards");

    assert!(output.reports[0].error.is_none());
    match &output.reports[1].error {
        Some(ImageError::LayoutMismatch { row, found }) => {
            assert_eq!(*row, 0);
            assert_eq!(found, &vec![100, 200]);
        }
        other => panic!("expected LayoutMismatch, got {other:?}"),
    }
    // Deck order is input order even though inputs run concurrently.
    assert_eq!(output.reports[0].index, 0);
    assert_eq!(output.reports[1].index, 1);
}

#[tokio::test]
async fn all_scans_failing_is_fatal() {
    let dir = TempDir::new().unwrap();
    let bad = save_png(dir.path(), "bad.png", &double_divider_scan());

    let err = extract(&[bad], &test_config(300)).await.unwrap_err();
    match err {
        CardSliceError::AllImagesFailed { total, first_error } => {
            assert_eq!(total, 1);
            assert!(
                first_error.contains("vertical separator"),
                "got: {first_error}"
            );
        }
        other => panic!("expected AllImagesFailed, got {other}"),
    }
}

#[tokio::test]
async fn blank_card_region_is_an_empty_region_error() {
    let dir = TempDir::new().unwrap();
    // Rules and divider but no content blobs anywhere.
    let mut img = RgbaImage::from_pixel(300, 300, WHITE);
    for x in 0..300 {
        img.put_pixel(x, 100, BLACK);
    }
    for y in 0..300 {
        img.put_pixel(150, y, BLACK);
    }
    let path = save_png(dir.path(), "blank.png", &img);

    let err = extract(&[path], &test_config(300)).await.unwrap_err();
    match err {
        CardSliceError::AllImagesFailed { first_error, .. } => {
            assert!(first_error.contains("no ink"), "got: {first_error}");
        }
        other => panic!("expected AllImagesFailed, got {other}"),
    }
}

#[tokio::test]
async fn missing_input_fails_before_any_processing() {
    let err = extract(
        &[PathBuf::from("/definitely/not/a/real/scan.png")],
        &test_config(300),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CardSliceError::FileNotFound { .. }));
}

#[tokio::test]
async fn empty_input_list_is_rejected() {
    let err = extract(&[], &test_config(300)).await.unwrap_err();
    assert!(matches!(err, CardSliceError::NoInputs));
}

// ── Package export ───────────────────────────────────────────────────────────

#[tokio::test]
async fn extract_to_package_writes_an_apkg() {
    let dir = TempDir::new().unwrap();
    let scan = grid_scan(300, 300, &[100, 200], 150);
    let path = save_png(dir.path(), "page.png", &scan);
    let out = dir.path().join("deck.apkg");

    let mut config = test_config(300);
    config.deck_name = "pipeline test deck".to_string();

    let output = extract_to_package(&[path], &out, &config).await.expect("export succeeds");

    assert_eq!(output.stats.total_cards, 3);
    let meta = std::fs::metadata(&out).expect("package file exists");
    assert!(meta.len() > 0, "package file must not be empty");
    assert!(!out.with_extension("apkg.tmp").exists(), "no temp file left");
}

// ── Multiple inputs keep deck order ──────────────────────────────────────────

#[tokio::test]
async fn cards_follow_input_order_across_scans() {
    let dir = TempDir::new().unwrap();
    // Distinguish the scans by blob position: first scan's rows start at
    // y = 0, second scan's single row fills the page.
    let first = save_png(dir.path(), "a.png", &grid_scan(300, 300, &[100, 200], 150));
    let second = save_png(dir.path(), "b.png", &grid_scan(300, 300, &[], 150));

    let output = extract(&[first, second], &test_config(300)).await.unwrap();

    assert_eq!(output.flashcards.len(), 4);
    assert_eq!(output.reports[0].cards, 3);
    assert_eq!(output.reports[1].cards, 1);
}
