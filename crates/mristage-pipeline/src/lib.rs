//! mristage-pipeline: deterministic tumor staging over MRI images (sans-IO).
//!
//! Stages an image through:
//! grayscale -> 5x5 binomial blur -> Canny edges -> outer contours ->
//! largest-area thresholds -> [`StagingVerdict`].
//!
//! The heuristic is a fixed-threshold contour-area classifier, not a
//! trained model; its confidences are constants per stage.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! images or byte slices and returns structured data. Reading files,
//! writing PNGs and installing a log subscriber live in `mristage-cli`.

pub mod blur;
pub mod canny;
pub mod contour;
pub mod diagnostics;
pub mod edge;
pub mod grayscale;
pub mod render;
pub mod staging;
pub mod summary;
pub mod types;
pub mod verdict;

pub use contour::{ContourTracer, ContourTracerKind};
pub use render::render;
pub use summary::BatchSummary;
pub use types::{
    BoundingBox, Contour, Dimensions, DynamicImage, GrayImage, Point, RgbImage, StagedAnalysis,
    StagingConfig, StagingError,
};
pub use verdict::{Location, Malignancy, Stage, StagingVerdict};

/// Stage an image.
///
/// # Pipeline steps
///
/// 1. Reduce to one intensity channel
/// 2. 5×5 smoothing (noise reduction)
/// 3. Canny edge detection
/// 4. Outer contour tracing
/// 5. Largest-area staging
///
/// The result depends only on the pixels and `config`: repeated calls
/// return identical verdicts.
///
/// # Errors
///
/// Returns [`StagingError::ZeroArea`] if the image has no pixels.
pub fn analyze(image: &DynamicImage, config: &StagingConfig) -> Result<StagingVerdict, StagingError> {
    analyze_staged(image, config).map(|staged| staged.verdict)
}

/// Decode raw image bytes (PNG, JPEG, BMP, WebP) and stage the image.
///
/// # Errors
///
/// Returns [`StagingError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`StagingError::ImageDecode`] if the image format is unrecognized.
/// Returns [`StagingError::ZeroArea`] if the decoded image has no pixels.
pub fn analyze_bytes(
    image_bytes: &[u8],
    config: &StagingConfig,
) -> Result<StagingVerdict, StagingError> {
    let image = grayscale::decode(image_bytes)?;
    analyze(&image, config)
}

/// Stage an image, keeping every intermediate raster and the contours.
///
/// Runs the same steps as [`diagnostics::analyze_with_diagnostics`]
/// without timing them.
///
/// # Errors
///
/// Returns [`StagingError::ZeroArea`] if the image has no pixels.
pub fn analyze_staged(
    image: &DynamicImage,
    config: &StagingConfig,
) -> Result<StagedAnalysis, StagingError> {
    diagnostics::analyze_with_diagnostics(image, config, &diagnostics::Untimed)
        .map(|(staged, _)| staged)
}

/// Run the grayscale, blur, edge and contour steps and return the
/// outer contours.
///
/// Shared by the classifier and [`render()`]; neither hands its
/// contours to the other.
///
/// # Errors
///
/// Returns [`StagingError::ZeroArea`] if the image has no pixels.
pub fn extract_contours(
    image: &DynamicImage,
    config: &StagingConfig,
) -> Result<Vec<Contour>, StagingError> {
    analyze_staged(image, config).map(|staged| staged.contours)
}
