use crate::Ruleset;
use serde::{Deserialize, Serialize};

/// Decay applied to each subsequent play when summing a user's best plays.
pub const PERFORMANCE_WEIGHT_DECAY: f64 = 0.95;
/// Number of best plays that contribute to a user's total performance.
pub const MAX_WEIGHTED_PLAYS: usize = 100;

/// Aggregated statistics of one user in one ruleset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStatistics {
    pub user_id: u32,
    pub ruleset: Ruleset,
    pub playcount: u32,
    pub total_score: u64,
    pub ranked_score: u64,
    pub total_hits: u64,
    pub max_combo: u32,
    /// Seconds spent playing.
    pub play_time: u64,
    pub pp: f64,
    /// Weighted accuracy of the best plays, `0.0..=1.0`.
    pub accuracy: f64,
}
impl UserStatistics {
    /// Statistics of a user that has never played `ruleset`.
    pub fn new(user_id: u32, ruleset: Ruleset) -> Self {
        Self {
            user_id,
            ruleset,
            playcount: 0,
            total_score: 0,
            ranked_score: 0,
            total_hits: 0,
            max_combo: 0,
            play_time: 0,
            pp: 0.0,
            accuracy: 0.0,
        }
    }

    /// Recompute performance and accuracy from a user's best plays.
    ///
    /// `plays` holds `(pp, accuracy)` pairs sorted by descending pp; anything
    /// beyond [`MAX_WEIGHTED_PLAYS`] is ignored. `ranked_plays` is the total
    /// number of beatmaps with a performance-awarding play, used for the bonus.
    pub fn apply_best_plays(&mut self, plays: &[(f64, f64)], ranked_plays: u64) {
        let mut pp = 0.0;
        let mut accuracy = 0.0;
        let mut weight_sum = 0.0;
        let mut weight = 1.0;
        for (play_pp, play_accuracy) in plays.iter().take(MAX_WEIGHTED_PLAYS) {
            pp += play_pp * weight;
            accuracy += play_accuracy * weight;
            weight_sum += weight;
            weight *= PERFORMANCE_WEIGHT_DECAY;
        }
        // Bonus for the number of plays, approaching ~416.67pp.
        let bonus_plays = ranked_plays.min(1000) as i32;
        pp += 416.6667 * (1.0 - 0.995f64.powi(bonus_plays));
        self.pp = pp;
        self.accuracy = if weight_sum > 0.0 { accuracy / weight_sum } else { 0.0 };
    }
}
