//! Aggregate statistics over a batch of verdicts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::verdict::{Stage, StagingVerdict};

/// Counts and mean confidence across a set of staged images.
///
/// Only stages that occur in the batch appear in
/// [`stage_distribution`](Self::stage_distribution); the map iterates
/// from least to most severe.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of verdicts summarized.
    pub total_cases: usize,
    /// Verdicts whose stage reports a detected region.
    pub tumor_cases: usize,
    /// Verdict count per stage, including `Stage::NoTumor`.
    pub stage_distribution: BTreeMap<Stage, usize>,
    /// Mean of the verdict confidences; `0.0` for an empty batch.
    pub average_confidence: f64,
}

impl BatchSummary {
    /// Summarize `verdicts`.
    #[must_use]
    pub fn from_verdicts<'a, I>(verdicts: I) -> Self
    where
        I: IntoIterator<Item = &'a StagingVerdict>,
    {
        let mut summary = Self::default();
        let mut confidence_sum = 0.0;

        for verdict in verdicts {
            summary.total_cases += 1;
            if verdict.stage().is_tumor() {
                summary.tumor_cases += 1;
            }
            *summary
                .stage_distribution
                .entry(verdict.stage())
                .or_insert(0) += 1;
            confidence_sum += verdict.confidence();
        }

        if summary.total_cases > 0 {
            #[allow(clippy::cast_precision_loss)]
            let n = summary.total_cases as f64;
            summary.average_confidence = confidence_sum / n;
        }
        summary
    }

    /// Format the summary as a human-readable table.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = vec![
            format!("Batch Summary\n{}", "=".repeat(40)),
            format!("Total cases:        {}", self.total_cases),
            format!("Tumor cases:        {}", self.tumor_cases),
            format!("Average confidence: {:.1}%", self.average_confidence * 100.0),
        ];

        if !self.stage_distribution.is_empty() {
            lines.push(String::new());
            lines.push(format!("{:<20} {:>6}", "Stage", "Cases"));
            lines.push("-".repeat(27));
            for (stage, count) in &self.stage_distribution {
                lines.push(format!("{:<20} {count:>6}", stage.label()));
            }
        }

        lines.join("\n")
    }
}
