use super::{ScoreContext, StatisticsProcessor};
use scorestats_models::UserStatistics;

/// Total score counts every play; ranked score only passes on beatmaps with
/// a ranked leaderboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct TotalScoreProcessor;

impl StatisticsProcessor for TotalScoreProcessor {
    fn name(&self) -> &'static str {
        "total_score"
    }

    fn apply(&self, context: &ScoreContext<'_>, stats: &mut UserStatistics) {
        let score = context.score;
        stats.total_score = stats.total_score.saturating_add(score.total_score);
        if score.passed && context.beatmap.status.is_ranked() {
            stats.ranked_score = stats.ranked_score.saturating_add(score.total_score);
        }
    }
}
