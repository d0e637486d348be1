use super::{ScoreContext, StatisticsProcessor};
use scorestats_models::UserStatistics;

#[derive(Debug, Default, Clone, Copy)]
pub struct TotalHitsProcessor;

impl StatisticsProcessor for TotalHitsProcessor {
    fn name(&self) -> &'static str {
        "total_hits"
    }

    fn apply(&self, context: &ScoreContext<'_>, stats: &mut UserStatistics) {
        stats.total_hits = stats.total_hits.saturating_add(context.score.total_hits());
    }
}

/// Highest combo of any passed play.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaxComboProcessor;

impl StatisticsProcessor for MaxComboProcessor {
    fn name(&self) -> &'static str {
        "max_combo"
    }

    fn apply(&self, context: &ScoreContext<'_>, stats: &mut UserStatistics) {
        if context.score.passed {
            stats.max_combo = stats.max_combo.max(context.score.max_combo);
        }
    }
}
