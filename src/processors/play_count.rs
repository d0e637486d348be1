use super::{ScoreContext, StatisticsProcessor};
use scorestats_models::UserStatistics;

/// Every submitted score is a play, passed or not.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlayCountProcessor;

impl StatisticsProcessor for PlayCountProcessor {
    fn name(&self) -> &'static str {
        "play_count"
    }

    fn apply(&self, _context: &ScoreContext<'_>, stats: &mut UserStatistics) {
        stats.playcount = stats.playcount.saturating_add(1);
    }
}
