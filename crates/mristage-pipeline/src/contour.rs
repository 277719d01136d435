//! Contour tracing: extract closed borders from a binary edge map.
//!
//! This module defines the [`ContourTracer`] trait for pluggable contour
//! retrieval and the [`ContourTracerKind`] enum for selecting one from
//! the config.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use serde::{Deserialize, Serialize};

use crate::types::{Contour, Point};

/// Selects which contour retrieval strategy to use.
///
/// Only [`OuterBorders`](Self::OuterBorders) exists; the enum keeps the
/// config format stable if another strategy is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContourTracerKind {
    /// Suzuki-Abe border following, keeping only outermost borders.
    ///
    /// A region nested inside another region's hole is not reported
    /// separately, and neither are hole borders.
    #[default]
    OuterBorders,
}

/// Trait for contour tracing strategies.
///
/// Input: a binary edge map (non-zero pixels = edges, zero = background).
/// Output: one closed contour per retained border.
pub trait ContourTracer {
    /// Trace contours in the given binary edge map.
    fn trace(&self, edges: &GrayImage) -> Vec<Contour>;
}

impl ContourTracer for ContourTracerKind {
    fn trace(&self, edges: &GrayImage) -> Vec<Contour> {
        match *self {
            Self::OuterBorders => trace_outer_borders(edges),
        }
    }
}

/// Suzuki-Abe border following via `imageproc::contours::find_contours`,
/// filtered to top-level outer borders.
///
/// A border without a parent is outermost; `find_contours` gives every
/// hole border and every border nested inside a hole a parent.
fn trace_outer_borders(edges: &GrayImage) -> Vec<Contour> {
    find_contours::<u32>(edges)
        .into_iter()
        .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
        .map(|c| Contour::new(c.points.into_iter().map(|p| Point::new(p.x, p.y)).collect()))
        .collect()
}
