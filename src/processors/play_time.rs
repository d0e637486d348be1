use super::{ScoreContext, StatisticsProcessor};
use scorestats_models::UserStatistics;

/// Adds the length of the play in whole seconds. Scores without a start time
/// contribute nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlayTimeProcessor;

impl StatisticsProcessor for PlayTimeProcessor {
    fn name(&self) -> &'static str {
        "play_time"
    }

    fn apply(&self, context: &ScoreContext<'_>, stats: &mut UserStatistics) {
        let seconds = context.score.play_time().map_or(0, |duration| duration.whole_seconds().max(0));
        stats.play_time = stats.play_time.saturating_add(seconds.unsigned_abs());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::fixtures;
    use scorestats_models::{ApprovalStatus, Ruleset};

    #[test]
    fn test_unknown_start_adds_nothing() {
        let beatmap = fixtures::beatmap(1, ApprovalStatus::Ranked);
        let mut score = fixtures::score(1, 1);
        score.started_at = None;
        let mut stats = UserStatistics::new(2, Ruleset::Osu);
        PlayTimeProcessor.apply(&ScoreContext { score: &score, beatmap: &beatmap, ranked: true }, &mut stats);
        assert_eq!(stats.play_time, 0);
    }
}
