//! Shared types for the mristage staging pipeline.

use serde::{Deserialize, Serialize};

use crate::contour::ContourTracerKind;
use crate::verdict::StagingVerdict;

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference the
/// annotated output of [`crate::render`] without depending on `image`.
pub use image::RgbImage;

/// Re-export `DynamicImage`, the accepted input type.
pub use image::DynamicImage;

/// A pixel position in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Column (pixels from left edge).
    pub x: u32,
    /// Row (pixels from top edge).
    pub y: u32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box, inclusive of both corner pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels (at least 1).
    pub width: u32,
    /// Height in pixels (at least 1).
    pub height: u32,
}

/// A closed border traced around one connected region of an edge map.
///
/// The points are the border pixels in tracing order; the last point
/// connects back to the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contour(Vec<Point>);

impl Contour {
    /// Create a contour from its border points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of border points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all border points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Area enclosed by the border polygon, in square pixels.
    ///
    /// Shoelace formula over the point sequence treated as a closed
    /// polygon through pixel centers. Contours with fewer than three
    /// points enclose nothing and return `0.0`. The sum is accumulated
    /// in integers, so the result is exact (a multiple of `0.5`).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn area(&self) -> f64 {
        if self.0.len() < 3 {
            return 0.0;
        }
        let twice_signed: i64 = self
            .0
            .iter()
            .zip(self.0.iter().cycle().skip(1))
            .map(|(a, b)| {
                i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y)
            })
            .sum();
        twice_signed.unsigned_abs() as f64 / 2.0
    }

    /// Smallest axis-aligned box containing every border point.
    ///
    /// Returns `None` for an empty contour.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.0.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.0[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Tunable constants of the staging pipeline.
///
/// The defaults reproduce the fixed heuristic: a 5×5 binomial kernel,
/// Canny thresholds 30/100, outer borders only, and stage boundaries at
/// 1000, 5000 and 15000 square pixels. Every field has a serde default,
/// so a partial JSON object is a valid config.
///
/// [`analyze`](crate::analyze) never fails because of the config: Canny
/// thresholds are clamped inside [`edge::canny`](crate::edge::canny) and
/// the stage bounds are checked in ascending order. Call
/// [`validate`](Self::validate) where a config enters the program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Sigma of sampled Gaussian taps for the 5×5 smoothing kernel.
    /// `None` (the default) uses the binomial taps
    /// [`blur::BINOMIAL_TAPS`](crate::blur::BINOMIAL_TAPS).
    pub blur_sigma: Option<f32>,

    /// Canny hysteresis low threshold (gradient magnitude, 0-255 scale).
    pub canny_low: f32,

    /// Canny hysteresis high threshold.
    pub canny_high: f32,

    /// Which contour tracing strategy to use.
    pub contour_tracer: ContourTracerKind,

    /// Largest contour areas at or above this are at least Stage II.
    pub stage_ii_min_area: f64,

    /// Largest contour areas at or above this are at least Stage III.
    pub stage_iii_min_area: f64,

    /// Largest contour areas at or above this are Stage IV.
    pub stage_iv_min_area: f64,
}

impl StagingConfig {
    /// Default Canny low threshold.
    pub const DEFAULT_CANNY_LOW: f32 = 30.0;
    /// Default Canny high threshold.
    pub const DEFAULT_CANNY_HIGH: f32 = 100.0;
    /// Default lower area bound of Stage II.
    pub const DEFAULT_STAGE_II_MIN_AREA: f64 = 1000.0;
    /// Default lower area bound of Stage III.
    pub const DEFAULT_STAGE_III_MIN_AREA: f64 = 5000.0;
    /// Default lower area bound of Stage IV.
    pub const DEFAULT_STAGE_IV_MIN_AREA: f64 = 15000.0;

    /// Check the config's invariants.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError::InvalidConfig`] naming the first violated
    /// rule: a non-positive or non-finite `blur_sigma`, `canny_low` below
    /// [`edge::MIN_THRESHOLD`](crate::edge::MIN_THRESHOLD), `canny_low`
    /// above `canny_high`, or stage area bounds that are not finite,
    /// positive and strictly ascending.
    pub fn validate(&self) -> Result<(), StagingError> {
        if let Some(sigma) = self.blur_sigma
            && (!sigma.is_finite() || sigma <= 0.0)
        {
            return Err(StagingError::InvalidConfig(format!(
                "blur_sigma must be finite and positive, got {sigma}"
            )));
        }
        if !self.canny_low.is_finite() || self.canny_low < crate::edge::MIN_THRESHOLD {
            return Err(StagingError::InvalidConfig(format!(
                "canny_low must be at least {}, got {}",
                crate::edge::MIN_THRESHOLD,
                self.canny_low
            )));
        }
        if !self.canny_high.is_finite() || self.canny_low > self.canny_high {
            return Err(StagingError::InvalidConfig(format!(
                "canny_low ({}) must not exceed canny_high ({})",
                self.canny_low, self.canny_high
            )));
        }
        let bounds = [
            ("stage_ii_min_area", self.stage_ii_min_area),
            ("stage_iii_min_area", self.stage_iii_min_area),
            ("stage_iv_min_area", self.stage_iv_min_area),
        ];
        for (name, value) in bounds {
            if !value.is_finite() || value <= 0.0 {
                return Err(StagingError::InvalidConfig(format!(
                    "{name} must be finite and positive, got {value}"
                )));
            }
        }
        if !(self.stage_ii_min_area < self.stage_iii_min_area
            && self.stage_iii_min_area < self.stage_iv_min_area)
        {
            return Err(StagingError::InvalidConfig(format!(
                "stage area bounds must be strictly ascending, got {} / {} / {}",
                self.stage_ii_min_area, self.stage_iii_min_area, self.stage_iv_min_area
            )));
        }
        Ok(())
    }
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            blur_sigma: None,
            canny_low: Self::DEFAULT_CANNY_LOW,
            canny_high: Self::DEFAULT_CANNY_HIGH,
            contour_tracer: ContourTracerKind::default(),
            stage_ii_min_area: Self::DEFAULT_STAGE_II_MIN_AREA,
            stage_iii_min_area: Self::DEFAULT_STAGE_III_MIN_AREA,
            stage_iv_min_area: Self::DEFAULT_STAGE_IV_MIN_AREA,
        }
    }
}

/// Result of running the staging pipeline with every intermediate kept.
///
/// Not `PartialEq`; compare [`verdict`](Self::verdict) instead.
#[derive(Debug, Clone)]
pub struct StagedAnalysis {
    /// Single-channel intensity image.
    pub grayscale: GrayImage,
    /// Output of the 5×5 smoothing.
    pub blurred: GrayImage,
    /// Binary Canny edge map (255 = edge).
    pub edges: GrayImage,
    /// Outer contours traced from the edge map.
    pub contours: Vec<Contour>,
    /// The staging verdict derived from `contours`.
    pub verdict: StagingVerdict,
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
}

/// Errors that can occur while staging an image.
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The decoded image has no pixels.
    #[error("image has zero area ({width}x{height})")]
    ZeroArea {
        /// Width of the rejected image.
        width: u32,
        /// Height of the rejected image.
        height: u32,
    },

    /// Staging configuration is invalid.
    #[error("invalid staging configuration: {0}")]
    InvalidConfig(String),
}

impl StagingError {
    /// Whether the error means the input image itself is unusable.
    ///
    /// The caller should ask for a different image; retrying the same
    /// input cannot succeed.
    #[must_use]
    pub const fn is_invalid_image(&self) -> bool {
        matches!(
            self,
            Self::ImageDecode(_) | Self::EmptyInput | Self::ZeroArea { .. }
        )
    }
}
