//! Analysis diagnostics: timing, counts, and other metrics for each stage.
//!
//! These are instrumentation for threshold tuning. The crate never reads
//! a system clock itself; callers pass a [`Clock`] to
//! [`analyze_with_diagnostics`] and the native binary supplies one backed
//! by `std::time::Instant`.
//!
//! [`analyze_with_diagnostics`] is the only implementation of the
//! pipeline steps. [`analyze_staged`](crate::analyze_staged) runs it with
//! a clock that never advances and drops the diagnostics.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::contour::ContourTracer;
use crate::types::{Contour, DynamicImage, StagedAnalysis, StagingConfig, StagingError};
use crate::verdict::Stage;
use crate::{blur, edge, grayscale, staging};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom("duration seconds must be finite and non-negative")
        })
    }
}

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current point in time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Clock for untimed runs: every duration is zero.
pub(crate) struct Untimed;

impl Clock for Untimed {
    type Instant = ();

    fn now(&self) {}

    fn elapsed(&self, _since: &()) -> Duration {
        Duration::ZERO
    }
}

/// Diagnostics collected from a single staging run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDiagnostics {
    /// Step 1: intensity channel extraction.
    pub grayscale: StageDiagnostics,
    /// Step 2: 5×5 smoothing.
    pub blur: StageDiagnostics,
    /// Step 3: Canny edge detection.
    pub edge_detection: StageDiagnostics,
    /// Step 4: contour tracing.
    pub contour_tracing: StageDiagnostics,
    /// Step 5: area-threshold staging.
    pub classification: StageDiagnostics,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all steps.
    pub summary: AnalysisSummary,
}

/// Diagnostics for a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this step (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Step-specific metrics.
    pub metrics: StageMetrics,
}

/// Step-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    Grayscale {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Channel count of the input before reduction.
        input_channels: u8,
    },
    Blur {
        /// Sigma of the Gaussian taps; `None` for the binomial default.
        sigma: Option<f32>,
    },
    EdgeDetection {
        /// Low threshold (after clamping).
        low_threshold: f32,
        /// High threshold (after clamping).
        high_threshold: f32,
        /// Number of edge pixels (value == 255) in the output.
        edge_pixel_count: u64,
        /// Total pixel count for computing edge density.
        total_pixel_count: u64,
    },
    ContourTracing {
        /// Number of outer contours traced.
        contour_count: usize,
        /// Total number of boundary points across all contours.
        total_point_count: usize,
        /// Points in the shortest contour, 0 when there are none.
        min_contour_points: usize,
        /// Points in the longest contour, 0 when there are none.
        max_contour_points: usize,
        /// Mean points per contour, 0 when there are none.
        mean_contour_points: f64,
    },
    Classification {
        /// Assigned stage.
        stage: Stage,
        /// Largest enclosed contour area in square pixels.
        largest_area: f64,
        /// Number of contours counted as regions.
        tumor_count: usize,
    },
}

/// High-level summary for the entire run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Image width in pixels.
    pub image_width: u32,
    /// Image height in pixels.
    pub image_height: u32,
    /// `image_width * image_height`.
    pub pixel_count: u64,
    /// Number of outer contours traced.
    pub contour_count: usize,
    /// Assigned stage.
    pub stage: Stage,
}

impl AnalysisDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Staging Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<20} {:>10} {:>10}  {}",
            "Step", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let steps = [
            ("Grayscale", &self.grayscale),
            ("Blur", &self.blur),
            ("Edge Detection", &self.edge_detection),
            ("Contour Tracing", &self.contour_tracing),
            ("Classification", &self.classification),
        ];

        for (name, diag) in steps {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<20} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Contours: {}  |  Verdict: {}",
            self.summary.contour_count, self.summary.stage,
        ));

        lines.join("\n")
    }
}

/// Run the staged analysis, timing each step with `clock`.
///
/// # Pipeline steps
///
/// 1. Reduce to one intensity channel
/// 2. 5×5 smoothing (noise reduction)
/// 3. Canny edge detection
/// 4. Outer contour tracing
/// 5. Largest-area staging
///
/// # Errors
///
/// Returns [`StagingError::ZeroArea`] if the image has no pixels.
pub fn analyze_with_diagnostics<C: Clock>(
    image: &DynamicImage,
    config: &StagingConfig,
    clock: &C,
) -> Result<(StagedAnalysis, AnalysisDiagnostics), StagingError> {
    let run_start = clock.now();

    // 1. Intensity channel.
    let start = clock.now();
    let gray = grayscale::to_grayscale(image)?;
    let (width, height) = gray.dimensions();
    let pixel_count = u64::from(width) * u64::from(height);
    let grayscale_diag = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Grayscale {
            width,
            height,
            input_channels: image.color().channel_count(),
        },
    };

    // 2. Smoothing.
    let start = clock.now();
    let blurred = blur::gaussian_blur(&gray, config.blur_sigma);
    let blur_diag = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Blur {
            sigma: config.blur_sigma,
        },
    };

    // 3. Canny edge detection.
    let start = clock.now();
    let edges = edge::canny(&blurred, config.canny_low, config.canny_high);
    let duration = clock.elapsed(&start);
    let (low_threshold, high_threshold) = edge::clamp_thresholds(config.canny_low, config.canny_high);
    let edge_diag = StageDiagnostics {
        duration,
        metrics: StageMetrics::EdgeDetection {
            low_threshold,
            high_threshold,
            edge_pixel_count: count_edge_pixels(&edges),
            total_pixel_count: pixel_count,
        },
    };

    // 4. Contour tracing.
    let start = clock.now();
    let contours = config.contour_tracer.trace(&edges);
    let duration = clock.elapsed(&start);
    let stats = contour_stats(&contours);
    tracing::debug!(
        width,
        height,
        edge_pixels = count_edge_pixels(&edges),
        contours = contours.len(),
        "traced contours"
    );
    let contour_diag = StageDiagnostics {
        duration,
        metrics: StageMetrics::ContourTracing {
            contour_count: contours.len(),
            total_point_count: stats.total,
            min_contour_points: stats.min,
            max_contour_points: stats.max,
            mean_contour_points: stats.mean,
        },
    };

    // 5. Staging.
    let start = clock.now();
    let verdict = staging::stage_contours(&contours, config);
    let classification_diag = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Classification {
            stage: verdict.stage(),
            largest_area: verdict.largest_area(),
            tumor_count: verdict.tumor_count(),
        },
    };

    let total_duration = clock.elapsed(&run_start);
    tracing::debug!(
        stage = %verdict.stage(),
        tumor_count = verdict.tumor_count(),
        largest_area = verdict.largest_area(),
        total_ms = duration_ms(total_duration),
        "staged image"
    );

    let diagnostics = AnalysisDiagnostics {
        grayscale: grayscale_diag,
        blur: blur_diag,
        edge_detection: edge_diag,
        contour_tracing: contour_diag,
        classification: classification_diag,
        total_duration,
        summary: AnalysisSummary {
            image_width: width,
            image_height: height,
            pixel_count,
            contour_count: contours.len(),
            stage: verdict.stage(),
        },
    };

    let staged = StagedAnalysis {
        dimensions: crate::types::Dimensions { width, height },
        grayscale: gray,
        blurred,
        edges,
        contours,
        verdict,
    };

    Ok((staged, diagnostics))
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format step metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Grayscale {
            width,
            height,
            input_channels,
        } => format!("{width}x{height} from {input_channels} channel(s)"),
        StageMetrics::Blur { sigma: Some(sigma) } => format!("sigma={sigma:.2}"),
        StageMetrics::Blur { sigma: None } => "binomial 1-4-6-4-1".to_owned(),
        StageMetrics::EdgeDetection {
            low_threshold,
            high_threshold,
            edge_pixel_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *edge_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!(
                "low={low_threshold:.1} high={high_threshold:.1} edges={edge_pixel_count} ({density:.1}%)",
            )
        }
        StageMetrics::ContourTracing {
            contour_count,
            total_point_count,
            min_contour_points,
            max_contour_points,
            mean_contour_points,
        } => format!(
            "{contour_count} contours, {total_point_count} pts (min={min_contour_points} max={max_contour_points} mean={mean_contour_points:.1})",
        ),
        StageMetrics::Classification {
            stage,
            largest_area,
            tumor_count,
        } => format!("{stage}: {tumor_count} region(s), largest={largest_area:.0}px"),
    }
}

/// Count edge pixels (value == 255) in a grayscale image.
fn count_edge_pixels(image: &image::GrayImage) -> u64 {
    image
        .pixels()
        .map(|p| u64::from(u8::from(p.0[0] == 255)))
        .sum()
}

/// Point-count statistics for a set of contours.
struct ContourStats {
    total: usize,
    min: usize,
    max: usize,
    mean: f64,
}

fn contour_stats(contours: &[Contour]) -> ContourStats {
    let total: usize = contours.iter().map(Contour::len).sum();
    let min = contours.iter().map(Contour::len).min().unwrap_or(0);
    let max = contours.iter().map(Contour::len).max().unwrap_or(0);
    #[allow(clippy::cast_precision_loss)]
    let mean = if contours.is_empty() {
        0.0
    } else {
        total as f64 / contours.len() as f64
    };
    ContourStats {
        total,
        min,
        max,
        mean,
    }
}
