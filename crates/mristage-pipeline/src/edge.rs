//! Edge map construction with sanitized Canny thresholds.
//!
//! Wraps [`crate::canny::canny`] to turn the smoothed intensity image
//! into a binary edge map where white pixels (255) are edges and black
//! pixels (0) are background.

use image::GrayImage;

/// Minimum allowed Canny threshold.
///
/// A low threshold of zero lets hysteresis flood through every pixel
/// with any gradient at all, including the suppressed ones, turning the
/// edge map into solid regions.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Detect edges using the Canny algorithm.
///
/// Returns a binary image: 255 for edge pixels, 0 for non-edge.
///
/// Pixels with gradient magnitude strictly above `high_threshold` are
/// definite edges; those strictly above `low_threshold` (and not above
/// `high_threshold`) are edges only if connected to a definite edge. A
/// magnitude equal to a threshold does not pass it.
///
/// Both thresholds are clamped to a minimum of [`MIN_THRESHOLD`] and
/// `low_threshold` is clamped to be at most `high_threshold`, so any
/// config yields a well-formed edge map. NaN thresholds fall back to
/// [`MIN_THRESHOLD`].
///
/// This is step 3 in the pipeline, between smoothing and contour tracing.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let (low, high) = clamp_thresholds(low_threshold, high_threshold);
    crate::canny::canny(image, low, high)
}

/// The `(low, high)` pair [`canny`] actually runs with.
#[must_use]
pub fn clamp_thresholds(low_threshold: f32, high_threshold: f32) -> (f32, f32) {
    let high = high_threshold.max(MIN_THRESHOLD);
    let low = low_threshold.max(MIN_THRESHOLD).min(high);
    (low, high)
}
