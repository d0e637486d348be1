use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use scorestats_models::Score;

/// Insert shape of a processed score.
///
/// The full score is kept as JSON in `data`; the remaining columns exist so
/// best plays can be selected without decoding it.
pub(crate) struct ScoreRow {
    pub(crate) id: i64,
    pub(crate) user_id: i64,
    pub(crate) beatmap_id: i64,
    pub(crate) ruleset_id: i64,
    pub(crate) total_score: i64,
    pub(crate) accuracy: f64,
    pub(crate) max_combo: i64,
    pub(crate) passed: bool,
    pub(crate) ranked: bool,
    pub(crate) pp: Option<f64>,
    pub(crate) data: String,
    pub(crate) ended_at: i64,
}
impl ScoreRow {
    pub(crate) fn new(score: &Score, ranked: bool) -> Result<Self, Error> {
        Ok(Self {
            id: i64::try_from(score.id).or_raise(|| ErrorKind::InvalidData("score id"))?,
            user_id: i64::from(score.user_id),
            beatmap_id: i64::from(score.beatmap_id),
            ruleset_id: i64::from(score.ruleset),
            total_score: i64::try_from(score.total_score).or_raise(|| ErrorKind::InvalidData("total score"))?,
            accuracy: score.accuracy,
            max_combo: i64::from(score.max_combo),
            passed: score.passed,
            ranked,
            pp: score.pp,
            data: serde_json::to_string(score).or_raise(|| ErrorKind::InvalidData("score data"))?,
            ended_at: score.ended_at.unix_timestamp(),
        })
    }
}
