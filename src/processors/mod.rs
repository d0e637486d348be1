//! Statistics processors.
//!
//! Each processor folds one aspect of a score into the user's statistics.
//! They run in order, in memory, before anything is persisted; performance
//! and accuracy are recomputed from stored best plays afterwards.

mod hits;
mod play_count;
mod play_time;
mod total_score;

pub use self::hits::{MaxComboProcessor, TotalHitsProcessor};
pub use self::play_count::PlayCountProcessor;
pub use self::play_time::PlayTimeProcessor;
pub use self::total_score::TotalScoreProcessor;
use scorestats_models::{Beatmap, Score, UserStatistics};

/// Everything a processor may look at for one score.
#[derive(Debug, Clone, Copy)]
pub struct ScoreContext<'a> {
    pub score: &'a Score,
    pub beatmap: &'a Beatmap,
    /// Whether the score counts towards performance.
    pub ranked: bool,
}

pub trait StatisticsProcessor: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, context: &ScoreContext<'_>, stats: &mut UserStatistics);
}

/// Every built-in processor, in the order they run.
pub fn default_processors() -> Vec<Box<dyn StatisticsProcessor>> {
    vec![
        Box::new(PlayCountProcessor),
        Box::new(TotalScoreProcessor),
        Box::new(TotalHitsProcessor),
        Box::new(MaxComboProcessor),
        Box::new(PlayTimeProcessor),
    ]
}

#[cfg(test)]
pub(crate) mod fixtures {
    use scorestats_models::{ApprovalStatus, Beatmap, Mod, Ruleset, Score};
    use std::collections::BTreeMap;
    use time::macros::datetime;

    pub fn beatmap(id: u32, status: ApprovalStatus) -> Beatmap {
        Beatmap {
            id,
            beatmapset_id: id,
            ruleset: Ruleset::Osu,
            status,
            checksum: None,
        }
    }

    pub fn score(id: u64, beatmap_id: u32) -> Score {
        Score {
            id,
            user_id: 2,
            beatmap_id,
            ruleset: Ruleset::Osu,
            mods: vec![Mod::new("HD")],
            statistics: BTreeMap::from([("great".to_string(), 300), ("ok".to_string(), 20), ("miss".to_string(), 4)]),
            total_score: 750_000,
            accuracy: 0.96,
            max_combo: 410,
            passed: true,
            started_at: Some(datetime!(2024-06-01 10:00 UTC)),
            ended_at: datetime!(2024-06-01 10:02:30 UTC),
            pp: None,
        }
    }
}
