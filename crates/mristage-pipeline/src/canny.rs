//! Canny edge detection on an already smoothed image.
//!
//! Derived from `imageproc::edges::canny` (0.26) with these changes:
//!
//! - **No internal blur.** `imageproc` applies its own sigma-1.4
//!   Gaussian before the gradient; here smoothing is a separate,
//!   fixed-kernel pipeline step ([`crate::blur`]), so the detector
//!   works on its input directly.
//! - **L1 gradient magnitude** `|gx| + |gy|` instead of `hypot`, the
//!   conventional default the 30/100 thresholds are tuned against.
//! - **One-pixel-wide edges.** Non-maximum suppression compares
//!   strictly against the neighbor on the negative side of the gradient
//!   and loosely against the positive side, so the two-column gradient
//!   plateau of a step keeps only its first column.
//! - **Strict thresholds.** A pixel is strong only above
//!   `high_threshold` and weak only above `low_threshold`.
//! - **Hysteresis visits all 8 neighbors** with bounds checks (upstream
//!   skips north/northeast and underflows at `x = 0` / `y = 0`, see
//!   <https://github.com/image-rs/imageproc/issues/705>).
//! - No `unsafe` pixel access.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::definitions::Image;
use imageproc::filter::filter_clamped;
use imageproc::kernel;

/// Gradient magnitude per pixel.
type Magnitude = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Run Canny edge detection on a smoothed grayscale image.
///
/// Returns a binary image: 255 for edge pixels, 0 elsewhere. The
/// outermost pixel ring is never an edge. Images narrower or shorter
/// than 3 pixels have no interior and produce an empty edge map.
///
/// Callers must ensure `low_threshold <= high_threshold`;
/// [`crate::edge::canny`] clamps both before calling.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return GrayImage::new(width, height);
    }

    // 1. Intensity gradients.
    let gx: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_HORIZONTAL_3X3);
    let gy: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_VERTICAL_3X3);
    let g: Magnitude = ImageBuffer::from_fn(width, height, |x, y| {
        let h = gx.get_pixel(x, y).0[0].unsigned_abs();
        let v = gy.get_pixel(x, y).0[0].unsigned_abs();
        Luma([f32::from(h) + f32::from(v)])
    });

    // 2. Non-maximum suppression (make edges thinner).
    let thinned = non_maximum_suppression(&g, &gx, &gy);

    // 3. Hysteresis to keep strong edges and the weak edges touching them.
    hysteresis(&thinned, low_threshold, high_threshold)
}

/// Pixel offsets of the two neighbors along the gradient direction.
///
/// The direction is quantized to 0°, 45°, 90° or 135°. The first
/// offset is the neighbor a maximum must strictly exceed, the second the
/// one it must merely match.
fn gradient_neighbors(x_gradient: f32, y_gradient: f32) -> [(i32, i32); 2] {
    let mut angle = y_gradient.atan2(x_gradient).to_degrees();
    if angle < 0.0 {
        angle += 180.0;
    }
    if !(22.5..157.5).contains(&angle) {
        [(-1, 0), (1, 0)]
    } else if angle < 67.5 {
        [(-1, -1), (1, 1)]
    } else if angle < 112.5 {
        [(0, -1), (0, 1)]
    } else {
        [(1, -1), (-1, 1)]
    }
}

/// Zero every pixel that is not a local maximum along its gradient.
fn non_maximum_suppression(
    g: &Magnitude,
    gx: &Image<Luma<i16>>,
    gy: &Image<Luma<i16>>,
) -> Magnitude {
    let mut out = Magnitude::new(g.width(), g.height());
    for y in 1..g.height() - 1 {
        for x in 1..g.width() - 1 {
            let pixel = g.get_pixel(x, y).0[0];
            if pixel <= 0.0 {
                continue;
            }
            let [strict, loose] = gradient_neighbors(
                f32::from(gx.get_pixel(x, y).0[0]),
                f32::from(gy.get_pixel(x, y).0[0]),
            );
            // Interior pixel, so every offset stays in bounds.
            let at = |(dx, dy): (i32, i32)| {
                g.get_pixel(x.wrapping_add_signed(dx), y.wrapping_add_signed(dy)).0[0]
            };
            if pixel > at(strict) && pixel >= at(loose) {
                out.put_pixel(x, y, Luma([pixel]));
            }
        }
    }
    out
}

/// Mark strong pixels and grow them through weak neighbors.
///
/// Strong means strictly above `high_thresh`, weak strictly above
/// `low_thresh`.
/// Non-recursive depth-first flood over the 8-neighborhood.
fn hysteresis(input: &Magnitude, low_thresh: f32, high_thresh: f32) -> GrayImage {
    const EDGE: Luma<u8> = Luma([255]);
    const NEIGHBORS: [(i32, i32); 8] = [
        (1, 0),
        (1, 1),
        (0, 1),
        (-1, 1),
        (-1, 0),
        (-1, -1),
        (0, -1),
        (1, -1),
    ];

    let (w, h) = input.dimensions();
    let mut out = GrayImage::new(w, h);
    let mut stack = Vec::new();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            if input.get_pixel(x, y).0[0] <= high_thresh || out.get_pixel(x, y).0[0] != 0 {
                continue;
            }
            out.put_pixel(x, y, EDGE);
            stack.push((x, y));
            while let Some((nx, ny)) = stack.pop() {
                for (dx, dy) in NEIGHBORS {
                    let (px, py) = (nx.wrapping_add_signed(dx), ny.wrapping_add_signed(dy));
                    if px >= w || py >= h {
                        continue;
                    }
                    if input.get_pixel(px, py).0[0] > low_thresh && out.get_pixel(px, py).0[0] == 0
                    {
                        out.put_pixel(px, py, EDGE);
                        stack.push((px, py));
                    }
                }
            }
        }
    }
    out
}
