//! Visualization: outline detected regions on a copy of the input.
//!
//! [`render`] re-derives the contours itself through
//! [`crate::extract_contours`] instead of receiving them from the
//! classifier, so the two stay decoupled. Contour pixels are painted
//! green and each contour's bounding box red, both [`STROKE_WIDTH`]
//! pixels wide.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::types::{Contour, StagingConfig, StagingError};

/// Color of contour outlines.
pub const CONTOUR_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Color of bounding boxes.
pub const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Line thickness in pixels for outlines and boxes.
pub const STROKE_WIDTH: u32 = 2;

/// Render the detected contours onto an RGB copy of `image`.
///
/// Grayscale input is expanded to three equal channels; alpha is
/// dropped. The caller's image is only read.
///
/// # Errors
///
/// Returns [`StagingError::ZeroArea`] if the image has no pixels.
pub fn render(image: &DynamicImage, config: &StagingConfig) -> Result<RgbImage, StagingError> {
    let contours = crate::extract_contours(image, config)?;
    tracing::debug!(contours = contours.len(), "rendering annotations");
    Ok(annotate(image.to_rgb8(), &contours))
}

/// Paint contour outlines, then bounding boxes, onto `canvas`.
///
/// Boxes are drawn just outside each contour's extent so the outline
/// stays visible along the box's top and left sides.
#[must_use = "returns the annotated image"]
pub fn annotate(mut canvas: RgbImage, contours: &[Contour]) -> RgbImage {
    for contour in contours {
        for p in contour.points() {
            let stamp = Rect::at(coord(p.x), coord(p.y)).of_size(STROKE_WIDTH, STROKE_WIDTH);
            draw_filled_rect_mut(&mut canvas, stamp, CONTOUR_COLOR);
        }
    }

    for bbox in contours.iter().filter_map(Contour::bounding_box) {
        for ring in 1..=STROKE_WIDTH {
            let offset = coord(ring);
            let outline = Rect::at(coord(bbox.x) - offset, coord(bbox.y) - offset)
                .of_size(bbox.width + 2 * ring, bbox.height + 2 * ring);
            draw_hollow_rect_mut(&mut canvas, outline, BOX_COLOR);
        }
    }

    canvas
}

/// Pixel coordinate as the signed type the drawing API expects.
fn coord(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}
