//! Performance point calculation seam.

use scorestats_models::{DifficultyAttributes, Score};

/// Performance formula for one ruleset family.
///
/// Only called for passed scores on beatmaps eligible for performance,
/// with the difficulty attributes that apply to the score.
pub trait PerformanceCalculator: Send + Sync {
    /// Performance awarded to `score`, or `None` if the formula has nothing
    /// to say about it (e.g. an unsupported ruleset).
    fn calculate(&self, score: &Score, attributes: &DifficultyAttributes) -> Option<f64>;
}

/// Calculator that never awards performance.
///
/// Scores are still marked as ranked where eligible, so performance can be
/// filled in by a later reprocess.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPerformance;

impl PerformanceCalculator for NoPerformance {
    fn calculate(&self, _score: &Score, _attributes: &DifficultyAttributes) -> Option<f64> {
        None
    }
}
