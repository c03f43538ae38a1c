//! Content-based boundary refinement.
//!
//! The grid layout only says where a card's *cell* is; the handwriting
//! inside it usually occupies a fraction of that space. Cropping the whole
//! cell wastes most of each exported image on blank paper, so every cell is
//! tightened to the actual ink first and then padded back out by a small
//! clearance — clipped so the padding can never reach into a neighbouring
//! card even when it is configured larger than the gap between cells.

use crate::config::ExtractionConfig;
use crate::error::ImageError;
use crate::geometry::Rectangle;
use crate::pipeline::layout::CardBox;
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// The final crop rectangles for one card: content-tightened and
/// clearance-expanded, one per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardBoundary {
    pub front: Rectangle,
    pub back: Rectangle,
}

/// Find the tightest box enclosing all ink pixels within `region`.
///
/// `x1`/`y1` are the first column/row containing ink, `x2`/`y2` the last —
/// so a single ink column yields a degenerate-but-valid box. Coordinates are
/// absolute (full-image space).
///
/// A region with no ink pixel at all is a hard failure: an expected card
/// area being blank means the configured layout does not match the scan,
/// and guessing a boundary would silently produce wrong cards.
pub fn find_bounding_box(
    matrix: &GrayImage,
    region: Rectangle,
    config: &ExtractionConfig,
) -> Result<Rectangle, ImageError> {
    let full = Rectangle::new(0, matrix.width(), 0, matrix.height());
    let clipped = region.clipped_to(full);

    // Scan in sub-matrix coordinates, then re-anchor into full-image space.
    let mut x1 = None;
    let mut x2 = None;
    for dx in 0..clipped.width() {
        let has_ink = (0..clipped.height()).any(|dy| {
            matrix.get_pixel(clipped.x1 + dx, clipped.y1 + dy)[0] <= config.black_threshold
        });
        if has_ink {
            x1.get_or_insert(dx);
            x2 = Some(dx);
        }
    }

    let mut y1 = None;
    let mut y2 = None;
    for dy in 0..clipped.height() {
        let has_ink = (0..clipped.width()).any(|dx| {
            matrix.get_pixel(clipped.x1 + dx, clipped.y1 + dy)[0] <= config.black_threshold
        });
        if has_ink {
            y1.get_or_insert(dy);
            y2 = Some(dy);
        }
    }

    match (x1, x2, y1, y2) {
        (Some(x1), Some(x2), Some(y1), Some(y2)) => {
            Ok(Rectangle::new(x1, x2, y1, y2).translated(clipped.x1, clipped.y1))
        }
        _ => Err(ImageError::EmptyRegion { region }),
    }
}

/// Tighten `region` to its ink content, then grow the result by
/// `clearance_px` on all four sides, clipped to stay within `region`.
///
/// The clip uses `max`/`min` against the region's own edges, so the returned
/// boundary is always a sub-rectangle of `region` regardless of how large
/// the clearance is.
pub fn find_bounding_card(
    matrix: &GrayImage,
    region: Rectangle,
    clearance_px: u32,
    config: &ExtractionConfig,
) -> Result<Rectangle, ImageError> {
    let tight = find_bounding_box(matrix, region, config)?;
    Ok(tight.expanded(clearance_px).clipped_to(region))
}

/// Refine both sides of a raw grid cell into final crop rectangles.
pub fn refine_card_box(
    matrix: &GrayImage,
    card_box: &CardBox,
    clearance_px: u32,
    config: &ExtractionConfig,
) -> Result<CardBoundary, ImageError> {
    Ok(CardBoundary {
        front: find_bounding_card(matrix, card_box.front, clearance_px, config)?,
        back: find_bounding_card(matrix, card_box.back, clearance_px, config)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    const WHITE: Luma<u8> = Luma([255]);
    const BLACK: Luma<u8> = Luma([0]);

    fn blank(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, WHITE)
    }

    fn paint_block(img: &mut GrayImage, xs: std::ops::RangeInclusive<u32>, ys: std::ops::RangeInclusive<u32>) {
        for y in ys {
            for x in xs.clone() {
                img.put_pixel(x, y, BLACK);
            }
        }
    }

    fn config() -> ExtractionConfig {
        ExtractionConfig::default()
    }

    #[test]
    fn bounding_box_is_tight() {
        let mut img = blank(12, 12);
        paint_block(&mut img, 2..=8, 2..=8);
        let region = Rectangle::new(0, 12, 0, 12);
        let bbox = find_bounding_box(&img, region, &config()).unwrap();
        assert_eq!(bbox, Rectangle::new(2, 8, 2, 8));
    }

    #[test]
    fn bounding_box_ignores_ink_outside_the_region() {
        let mut img = blank(20, 20);
        paint_block(&mut img, 1..=1, 1..=1); // outside
        paint_block(&mut img, 10..=12, 10..=12); // inside
        let region = Rectangle::new(5, 20, 5, 20);
        let bbox = find_bounding_box(&img, region, &config()).unwrap();
        assert_eq!(bbox, Rectangle::new(10, 12, 10, 12));
    }

    #[test]
    fn blank_region_is_a_hard_error() {
        let img = blank(10, 10);
        let region = Rectangle::new(0, 10, 0, 10);
        let err = find_bounding_box(&img, region, &config()).unwrap_err();
        assert!(matches!(err, ImageError::EmptyRegion { .. }));
    }

    #[test]
    fn single_ink_pixel_yields_degenerate_box() {
        let mut img = blank(10, 10);
        img.put_pixel(5, 6, BLACK);
        let region = Rectangle::new(0, 10, 0, 10);
        let bbox = find_bounding_box(&img, region, &config()).unwrap();
        assert_eq!(bbox, Rectangle::new(5, 5, 6, 6));
    }

    #[test]
    fn clearance_expands_around_content() {
        let mut img = blank(40, 40);
        paint_block(&mut img, 15..=20, 15..=20);
        let region = Rectangle::new(0, 40, 0, 40);
        let card = find_bounding_card(&img, region, 3, &config()).unwrap();
        assert_eq!(card, Rectangle::new(12, 23, 12, 23));
    }

    #[test]
    fn clearance_never_exceeds_the_region() {
        let mut img = blank(40, 40);
        paint_block(&mut img, 15..=20, 15..=20);
        let region = Rectangle::new(10, 30, 10, 30);
        // Clearance far larger than the distance from ink to any edge.
        let card = find_bounding_card(&img, region, 1000, &config()).unwrap();
        assert_eq!(card, region);
        assert!(region.contains(card));
    }

    #[test]
    fn boundary_is_always_within_the_region() {
        let mut img = blank(60, 60);
        paint_block(&mut img, 22..=30, 25..=33);
        let region = Rectangle::new(20, 40, 20, 40);
        for clearance in [0, 1, 2, 5, 19, 20, 100] {
            let card = find_bounding_card(&img, region, clearance, &config()).unwrap();
            assert!(
                region.contains(card),
                "clearance {clearance}: {card} escapes {region}"
            );
        }
    }

    #[test]
    fn refining_a_card_box_tightens_both_sides() {
        let mut img = blank(100, 50);
        paint_block(&mut img, 10..=19, 10..=19); // front content
        paint_block(&mut img, 60..=79, 20..=29); // back content
        let card_box = CardBox {
            front: Rectangle::new(0, 45, 0, 50),
            back: Rectangle::new(55, 100, 0, 50),
        };
        let boundary = refine_card_box(&img, &card_box, 2, &config()).unwrap();
        assert_eq!(boundary.front, Rectangle::new(8, 21, 8, 21));
        assert_eq!(boundary.back, Rectangle::new(58, 81, 18, 31));
        assert!(card_box.front.contains(boundary.front));
        assert!(card_box.back.contains(boundary.back));
    }

    #[test]
    fn blank_front_side_fails_the_whole_card() {
        let mut img = blank(100, 50);
        paint_block(&mut img, 60..=79, 20..=29); // back only
        let card_box = CardBox {
            front: Rectangle::new(0, 45, 0, 50),
            back: Rectangle::new(55, 100, 0, 50),
        };
        let err = refine_card_box(&img, &card_box, 2, &config()).unwrap_err();
        assert!(matches!(err, ImageError::EmptyRegion { .. }));
    }
}
