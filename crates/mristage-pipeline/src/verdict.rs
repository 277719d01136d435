//! The staging verdict: the immutable output of one classification.
//!
//! A verdict's confidence and malignancy are functions of its stage, and
//! its location is a function of its tumor count. Fields are private so
//! those ties cannot be broken after construction; the serde proxy
//! re-checks them on deserialization.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stage bucket assigned from the largest contour area.
///
/// Variants are ordered by severity, so `Stage` can key an ordered map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// No contour was found in the edge map.
    #[serde(rename = "No tumor detected")]
    NoTumor,
    /// Largest area below the Stage II bound.
    #[serde(rename = "Stage I")]
    I,
    /// Largest area in `[stage_ii_min_area, stage_iii_min_area)`.
    #[serde(rename = "Stage II")]
    II,
    /// Largest area in `[stage_iii_min_area, stage_iv_min_area)`.
    #[serde(rename = "Stage III")]
    III,
    /// Largest area at or above the Stage IV bound.
    #[serde(rename = "Stage IV")]
    IV,
}

impl Stage {
    /// All stages, least to most severe.
    pub const ALL: [Self; 5] = [Self::NoTumor, Self::I, Self::II, Self::III, Self::IV];

    /// Display label, identical to the serialized form.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoTumor => "No tumor detected",
            Self::I => "Stage I",
            Self::II => "Stage II",
            Self::III => "Stage III",
            Self::IV => "Stage IV",
        }
    }

    /// Fixed confidence reported with this stage.
    ///
    /// Not a calibrated probability.
    #[must_use]
    pub const fn confidence(self) -> f64 {
        match self {
            Self::NoTumor => 0.95,
            Self::I => 0.85,
            Self::II => 0.80,
            Self::III => 0.75,
            Self::IV => 0.70,
        }
    }

    /// Malignancy label tied to this stage.
    #[must_use]
    pub const fn malignancy(self) -> Malignancy {
        match self {
            Self::NoTumor => Malignancy::Absent,
            Self::I => Malignancy::Low,
            Self::II => Malignancy::Moderate,
            Self::III | Self::IV => Malignancy::High,
        }
    }

    /// Whether this stage reports a detected region.
    #[must_use]
    pub const fn is_tumor(self) -> bool {
        !matches!(self, Self::NoTumor)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Qualitative severity, one-to-one with the stage bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Malignancy {
    /// No tumor detected.
    #[serde(rename = "None")]
    Absent,
    /// Stage I.
    Low,
    /// Stage II.
    Moderate,
    /// Stages III and IV.
    High,
}

impl Malignancy {
    /// Display label, identical to the serialized form.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Absent => "None",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Malignancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Qualitative descriptor of how many regions were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    /// Exactly one contour.
    #[serde(rename = "Single region")]
    Single,
    /// More than one contour.
    #[serde(rename = "Multiple regions")]
    Multiple,
}

impl Location {
    /// Location implied by a contour count; `None` when nothing was found.
    #[must_use]
    pub const fn from_count(tumor_count: usize) -> Option<Self> {
        match tumor_count {
            0 => None,
            1 => Some(Self::Single),
            _ => Some(Self::Multiple),
        }
    }

    /// Display label, identical to the serialized form.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Single => "Single region",
            Self::Multiple => "Multiple regions",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of staging one image.
///
/// Serializes to the flat mapping consumed by case storage:
///
/// ```json
/// {"stage":"Stage II","confidence":0.8,"tumor_count":1,
///  "largest_size":"1600 pixels","malignancy":"Moderate",
///  "location":"Single region"}
/// ```
///
/// `location` is omitted when no tumor was detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VerdictRecord", into = "VerdictRecord")]
pub struct StagingVerdict {
    stage: Stage,
    tumor_count: usize,
    largest_area: f64,
}

impl StagingVerdict {
    /// The verdict for an edge map without contours.
    #[must_use]
    pub const fn no_tumor() -> Self {
        Self {
            stage: Stage::NoTumor,
            tumor_count: 0,
            largest_area: 0.0,
        }
    }

    /// Build a verdict for `tumor_count` contours whose largest encloses
    /// `largest_area` square pixels, already bucketed into `stage`.
    ///
    /// Returns `None` when the parts contradict each other: a tumor stage
    /// with zero contours, [`Stage::NoTumor`] with contours, or a negative
    /// or non-finite area.
    #[must_use]
    pub fn detected(stage: Stage, tumor_count: usize, largest_area: f64) -> Option<Self> {
        if !stage.is_tumor() || tumor_count == 0 {
            return None;
        }
        if !largest_area.is_finite() || largest_area < 0.0 {
            return None;
        }
        Some(Self {
            stage,
            tumor_count,
            largest_area,
        })
    }

    /// Unchecked constructor for the classifier, which derives `stage`
    /// from a non-empty contour list itself.
    pub(crate) const fn from_parts(stage: Stage, tumor_count: usize, largest_area: f64) -> Self {
        Self {
            stage,
            tumor_count,
            largest_area,
        }
    }

    /// Stage bucket.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Fixed confidence for [`stage`](Self::stage).
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.stage.confidence()
    }

    /// Number of outer contours found.
    #[must_use]
    pub const fn tumor_count(&self) -> usize {
        self.tumor_count
    }

    /// Area of the largest contour in square pixels (`0.0` without tumor).
    #[must_use]
    pub const fn largest_area(&self) -> f64 {
        self.largest_area
    }

    /// Largest area as text, e.g. `"1600 pixels"`.
    #[must_use]
    pub fn largest_size(&self) -> String {
        format!("{:.0} pixels", self.largest_area)
    }

    /// Malignancy tied to [`stage`](Self::stage).
    #[must_use]
    pub const fn malignancy(&self) -> Malignancy {
        self.stage.malignancy()
    }

    /// Region descriptor; `None` when no tumor was detected.
    #[must_use]
    pub const fn location(&self) -> Option<Location> {
        Location::from_count(self.tumor_count)
    }
}

impl fmt::Display for StagingVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (confidence {:.0}%, malignancy {}, {} region(s), largest {})",
            self.stage,
            self.confidence() * 100.0,
            self.malignancy(),
            self.tumor_count,
            self.largest_size(),
        )
    }
}

/// Serde-compatible proxy for `StagingVerdict`.
///
/// Carries the derived fields explicitly so the serialized form is the
/// flat mapping downstream storage expects.
#[derive(Serialize, Deserialize)]
struct VerdictRecord {
    stage: Stage,
    confidence: f64,
    tumor_count: usize,
    largest_size: String,
    malignancy: Malignancy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<Location>,
}

impl From<StagingVerdict> for VerdictRecord {
    fn from(verdict: StagingVerdict) -> Self {
        Self {
            stage: verdict.stage,
            confidence: verdict.confidence(),
            tumor_count: verdict.tumor_count,
            largest_size: verdict.largest_size(),
            malignancy: verdict.malignancy(),
            location: verdict.location(),
        }
    }
}

impl TryFrom<VerdictRecord> for StagingVerdict {
    type Error = String;

    #[allow(clippy::float_cmp)]
    fn try_from(record: VerdictRecord) -> Result<Self, Self::Error> {
        if record.confidence != record.stage.confidence() {
            return Err(format!(
                "confidence {} does not match {} (expected {})",
                record.confidence,
                record.stage,
                record.stage.confidence()
            ));
        }
        if record.malignancy != record.stage.malignancy() {
            return Err(format!(
                "malignancy {} does not match {}",
                record.malignancy, record.stage
            ));
        }
        if record.location != Location::from_count(record.tumor_count) {
            return Err(format!(
                "location {:?} does not match tumor_count {}",
                record.location.map(Location::label),
                record.tumor_count
            ));
        }
        let largest_area = record
            .largest_size
            .strip_suffix(" pixels")
            .and_then(|n| n.trim().parse::<f64>().ok())
            .ok_or_else(|| format!("unparsable largest_size {:?}", record.largest_size))?;

        if record.stage.is_tumor() {
            Self::detected(record.stage, record.tumor_count, largest_area).ok_or_else(|| {
                format!(
                    "{} with tumor_count {} and area {largest_area}",
                    record.stage, record.tumor_count
                )
            })
        } else if record.tumor_count == 0 && largest_area == 0.0 {
            Ok(Self::no_tumor())
        } else {
            Err(format!(
                "{} with tumor_count {} and area {largest_area}",
                record.stage, record.tumor_count
            ))
        }
    }
}
