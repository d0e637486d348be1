use crate::error::{ErrorKind, Result};
use crate::{Mod, Ruleset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use time::OffsetDateTime;

/// Judgements that count as a hit towards a user's total hits.
const HIT_JUDGEMENTS: [&str; 5] = ["perfect", "great", "good", "ok", "meh"];

/// A submitted score, as produced by the score submission path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub id: u64,
    pub user_id: u32,
    pub beatmap_id: u32,
    pub ruleset: Ruleset,
    #[serde(default)]
    pub mods: Vec<Mod>,
    /// Judgement name to count, e.g. `{"great": 812, "miss": 3}`.
    #[serde(default)]
    pub statistics: BTreeMap<String, u32>,
    pub total_score: u64,
    pub accuracy: f64,
    pub max_combo: u32,
    pub passed: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub ended_at: OffsetDateTime,
    /// Performance awarded, filled in by processing.
    #[serde(default)]
    pub pp: Option<f64>,
}
impl Score {
    /// Sum of every judgement that counts as a hit.
    pub fn total_hits(&self) -> u64 {
        self.statistics
            .iter()
            .filter(|(judgement, _)| HIT_JUDGEMENTS.contains(&judgement.as_str()))
            .map(|(_, count)| u64::from(*count))
            .sum()
    }

    /// Length of the play, when the start time is known.
    pub fn play_time(&self) -> Option<time::Duration> {
        self.started_at.map(|started| self.ended_at - started)
    }

    /// Rejects scores whose data cannot have come from a real play.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.accuracy) || self.accuracy.is_nan() {
            exn::bail!(ErrorKind::ParseError {
                field: "accuracy",
                value: self.accuracy.to_string(),
            });
        }
        if let Some(duration) = self.play_time()
            && duration.is_negative()
        {
            exn::bail!(ErrorKind::ParseError {
                field: "started_at",
                value: format!("play ended {} before it started", -duration),
            });
        }
        Ok(())
    }
}

/// Record of a score having gone through processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessHistory {
    pub score_id: u64,
    pub processed_version: u8,
    #[serde(with = "time::serde::rfc3339")]
    pub processed_at: OffsetDateTime,
}

/// Unit of work travelling through the score queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreItem {
    pub score: Score,
    /// Present if the score was already processed at some point, e.g. when it
    /// is re-queued for a reprocess.
    #[serde(default)]
    pub history: Option<ProcessHistory>,
}
impl ScoreItem {
    pub fn new(score: Score) -> Self {
        Self { score, history: None }
    }

    /// Whether the item has already been processed by `version` or newer.
    pub fn is_processed(&self, version: u8) -> bool {
        self.history.as_ref().is_some_and(|h| h.processed_version >= version)
    }
}
impl Display for ScoreItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "score {} (user {}, beatmap {}, {})",
            self.score.id, self.score.user_id, self.score.beatmap_id, self.score.ruleset
        )
    }
}
