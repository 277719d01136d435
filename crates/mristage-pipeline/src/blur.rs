//! Fixed-size smoothing before edge detection.
//!
//! Edge detection on raw pixel noise produces spurious contours that
//! dominate the count, so the intensity image is smoothed first. The
//! kernel is always [`KERNEL_SIZE`] × [`KERNEL_SIZE`] and separable. By
//! default its taps are the binomial [`BINOMIAL_TAPS`]; an explicit
//! sigma swaps in sampled Gaussian taps instead.
//!
//! Borders mirror without repeating the edge pixel (`dcb|abcd|cba`), and
//! the weighted sums round to the nearest intensity, ties upward.

use image::{GrayImage, Luma};

/// Side length of the square smoothing kernel.
pub const KERNEL_SIZE: usize = 5;

const RADIUS: usize = KERNEL_SIZE / 2;

/// Default 1D taps, `[1, 4, 6, 4, 1] / 16`.
pub const BINOMIAL_TAPS: [f32; KERNEL_SIZE] = [
    1.0 / 16.0,
    4.0 / 16.0,
    6.0 / 16.0,
    4.0 / 16.0,
    1.0 / 16.0,
];

/// Normalized 1D Gaussian taps sampled at `-2..=2`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn gaussian_taps(sigma: f32) -> [f32; KERNEL_SIZE] {
    let denom = 2.0 * sigma * sigma;
    let mut taps = [0.0_f32; KERNEL_SIZE];
    for (i, tap) in taps.iter_mut().enumerate() {
        let d = i as f32 - RADIUS as f32;
        *tap = (-(d * d) / denom).exp();
    }
    let sum: f32 = taps.iter().sum();
    for tap in &mut taps {
        *tap /= sum;
    }
    taps
}

/// The 2D kernel, row-major: the outer product of `taps` with itself.
#[must_use]
pub fn kernel_2d(taps: &[f32; KERNEL_SIZE]) -> [f32; KERNEL_SIZE * KERNEL_SIZE] {
    std::array::from_fn(|i| taps[i / KERNEL_SIZE] * taps[i % KERNEL_SIZE])
}

/// Smooth a grayscale image with the fixed 5×5 kernel.
///
/// `None` uses [`BINOMIAL_TAPS`]. `Some(sigma)` uses
/// [`gaussian_taps`]; non-positive or non-finite sigma values return the
/// image unchanged.
///
/// This is step 2 in the pipeline, between grayscale conversion and
/// edge detection.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage, sigma: Option<f32>) -> GrayImage {
    let taps = match sigma {
        None => BINOMIAL_TAPS,
        Some(s) if s.is_finite() && s > 0.0 => gaussian_taps(s),
        Some(_) => return image.clone(),
    };

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    // Horizontal pass into f32 rows, then vertical pass with rounding.
    let w = width as usize;
    let h = height as usize;
    let src = image.as_raw();
    let mut rows = vec![0.0_f32; w * h];
    for y in 0..h {
        let line = &src[y * w..(y + 1) * w];
        for x in 0..w {
            rows[y * w + x] = taps
                .iter()
                .enumerate()
                .map(|(k, tap)| tap * f32::from(line[reflect(x, k, w)]))
                .sum();
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let sum: f32 = taps
            .iter()
            .enumerate()
            .map(|(k, tap)| tap * rows[reflect(y, k, h) * w + x])
            .sum();
        Luma([to_intensity(sum)])
    })
}

/// Source index for tap `k` centred on `i` in a line of length `n`,
/// mirrored at both ends without repeating the end sample.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
const fn reflect(i: usize, k: usize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let m = (i as isize + k as isize - RADIUS as isize).rem_euclid(period);
    let m = if m < n as isize { m } else { period - m };
    m as usize
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_intensity(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
