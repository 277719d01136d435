//! Area-threshold staging: contours in, verdict out.
//!
//! The largest enclosed contour area selects the stage bucket. Each
//! bucket's lower bound is inclusive, so an area exactly on a boundary
//! belongs to the more severe stage.

use crate::types::{Contour, StagingConfig};
use crate::verdict::{Stage, StagingVerdict};

/// Map a largest contour area to its stage bucket.
///
/// | area | stage |
/// |---|---|
/// | `< stage_ii_min_area` | Stage I |
/// | `< stage_iii_min_area` | Stage II |
/// | `< stage_iv_min_area` | Stage III |
/// | otherwise | Stage IV |
///
/// Never returns [`Stage::NoTumor`]: that verdict depends on the contour
/// count, not on an area.
#[must_use]
pub fn classify_area(area: f64, config: &StagingConfig) -> Stage {
    if area < config.stage_ii_min_area {
        Stage::I
    } else if area < config.stage_iii_min_area {
        Stage::II
    } else if area < config.stage_iv_min_area {
        Stage::III
    } else {
        Stage::IV
    }
}

/// Build the verdict for a set of traced contours.
///
/// No contours means [`StagingVerdict::no_tumor`]. Otherwise the stage
/// comes from [`classify_area`] applied to the largest contour area.
#[must_use]
pub fn stage_contours(contours: &[Contour], config: &StagingConfig) -> StagingVerdict {
    let Some(largest_area) = contours.iter().map(Contour::area).reduce(f64::max) else {
        return StagingVerdict::no_tumor();
    };
    let stage = classify_area(largest_area, config);
    StagingVerdict::from_parts(stage, contours.len(), largest_area)
}
