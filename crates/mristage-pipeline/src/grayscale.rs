//! Image decoding and grayscale conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) or an already decoded
//! [`DynamicImage`] and produces a single-channel intensity image.
//!
//! This is the first step in the pipeline and the only place input is
//! rejected: every later step is a total numeric transform.

use image::{DynamicImage, GrayImage};

use crate::types::StagingError;

/// Decode raw image bytes.
///
/// Supports whatever formats the `image` crate was built with.
///
/// # Errors
///
/// Returns [`StagingError::EmptyInput`] if `bytes` is empty.
/// Returns [`StagingError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, StagingError> {
    if bytes.is_empty() {
        return Err(StagingError::EmptyInput);
    }

    Ok(image::load_from_memory(bytes)?)
}

/// Reduce an image to one intensity channel.
///
/// Single-channel inputs are taken as-is; color inputs go through the
/// `image` crate's luminance conversion, which weights green above red
/// above blue. Alpha is ignored.
///
/// # Errors
///
/// Returns [`StagingError::ZeroArea`] if either dimension is zero.
pub fn to_grayscale(image: &DynamicImage) -> Result<GrayImage, StagingError> {
    ensure_non_empty(image)?;
    Ok(image.to_luma8())
}

/// Reject images without pixels.
///
/// # Errors
///
/// Returns [`StagingError::ZeroArea`] if either dimension is zero.
pub fn ensure_non_empty(image: &DynamicImage) -> Result<(), StagingError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(StagingError::ZeroArea { width, height });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Helper: encode an RGBA image as a PNG byte buffer.
    fn encode_png(img: &image::RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    /// Helper: encode a single 1x1 RGBA pixel as a PNG byte buffer.
    fn encode_rgba_pixel(r: u8, g: u8, b: u8) -> Vec<u8> {
        encode_png(&image::RgbaImage::from_pixel(
            1,
            1,
            image::Rgba([r, g, b, 255]),
        ))
    }

    #[test]
    fn empty_input_returns_error() {
        let result = decode(&[]);
        assert!(matches!(result, Err(StagingError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(StagingError::ImageDecode(_))));
    }

    #[test]
    fn valid_png_decodes() {
        let png = encode_png(&image::RgbaImage::from_pixel(
            17,
            31,
            image::Rgba([128, 64, 32, 255]),
        ));
        let img = decode(&png).unwrap();
        assert_eq!((img.width(), img.height()), (17, 31));
    }

    #[test]
    fn zero_area_image_is_rejected() {
        let img = DynamicImage::new_luma8(0, 0);
        let result = to_grayscale(&img);
        assert!(matches!(
            result,
            Err(StagingError::ZeroArea {
                width: 0,
                height: 0
            })
        ));
    }

    #[test]
    fn zero_width_image_is_rejected() {
        let img = DynamicImage::new_rgb8(0, 5);
        assert!(to_grayscale(&img).is_err());
    }

    #[test]
    fn grayscale_input_is_unchanged() {
        let gray = GrayImage::from_fn(4, 3, |x, y| image::Luma([u8::try_from(x * 10 + y).unwrap()]));
        let out = to_grayscale(&DynamicImage::ImageLuma8(gray.clone())).unwrap();
        assert_eq!(out, gray);
    }

    #[test]
    fn white_color_image_becomes_white() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            2,
            2,
            image::Rgb([255, 255, 255]),
        ));
        let gray = to_grayscale(&img).unwrap();
        for pixel in gray.pixels() {
            assert_eq!(pixel.0[0], 255);
        }
    }

    #[test]
    fn grayscale_conversion_weights_channels() {
        // Different RGB channels must produce different intensities,
        // confirming a weighted luminance conversion (not an average).
        let gray_of = |png: &[u8]| to_grayscale(&decode(png).unwrap()).unwrap().get_pixel(0, 0).0[0];
        let r_val = gray_of(&encode_rgba_pixel(255, 0, 0));
        let g_val = gray_of(&encode_rgba_pixel(0, 255, 0));
        let b_val = gray_of(&encode_rgba_pixel(0, 0, 255));

        assert!(
            g_val > r_val && r_val > b_val,
            "expected green > red > blue luminance, got R={r_val} G={g_val} B={b_val}",
        );
    }
}
