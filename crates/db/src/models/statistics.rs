use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use scorestats_models::{Ruleset, UserStatistics};

#[derive(sqlx::FromRow)]
pub(crate) struct UserStatisticsRow {
    pub(crate) user_id: i64,
    pub(crate) ruleset_id: i64,
    pub(crate) playcount: i64,
    pub(crate) total_score: i64,
    pub(crate) ranked_score: i64,
    pub(crate) total_hits: i64,
    pub(crate) max_combo: i64,
    pub(crate) play_time: i64,
    pub(crate) pp: f64,
    pub(crate) accuracy: f64,
}
impl TryFrom<&UserStatistics> for UserStatisticsRow {
    type Error = Error;
    fn try_from(stats: &UserStatistics) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: i64::from(stats.user_id),
            ruleset_id: i64::from(stats.ruleset),
            playcount: i64::from(stats.playcount),
            total_score: i64::try_from(stats.total_score).or_raise(|| ErrorKind::InvalidData("total score"))?,
            ranked_score: i64::try_from(stats.ranked_score).or_raise(|| ErrorKind::InvalidData("ranked score"))?,
            total_hits: i64::try_from(stats.total_hits).or_raise(|| ErrorKind::InvalidData("total hits"))?,
            max_combo: i64::from(stats.max_combo),
            play_time: i64::try_from(stats.play_time).or_raise(|| ErrorKind::InvalidData("play time"))?,
            pp: stats.pp,
            accuracy: stats.accuracy,
        })
    }
}
impl TryFrom<UserStatisticsRow> for UserStatistics {
    type Error = Error;
    fn try_from(row: UserStatisticsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: u32::try_from(row.user_id).or_raise(|| ErrorKind::InvalidData("user id"))?,
            ruleset: Ruleset::try_from(row.ruleset_id).or_raise(|| ErrorKind::InvalidData("ruleset"))?,
            playcount: u32::try_from(row.playcount).or_raise(|| ErrorKind::InvalidData("playcount"))?,
            total_score: u64::try_from(row.total_score).or_raise(|| ErrorKind::InvalidData("total score"))?,
            ranked_score: u64::try_from(row.ranked_score).or_raise(|| ErrorKind::InvalidData("ranked score"))?,
            total_hits: u64::try_from(row.total_hits).or_raise(|| ErrorKind::InvalidData("total hits"))?,
            max_combo: u32::try_from(row.max_combo).or_raise(|| ErrorKind::InvalidData("max combo"))?,
            play_time: u64::try_from(row.play_time).or_raise(|| ErrorKind::InvalidData("play time"))?,
            pp: row.pp,
            accuracy: row.accuracy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_counters_are_invalid() {
        let mut stats = UserStatistics::new(3, Ruleset::Taiko);
        stats.playcount = 12;
        let mut row = UserStatisticsRow::try_from(&stats).unwrap();
        assert_eq!(row.ruleset_id, 1);
        row.total_hits = -1;
        let err = UserStatistics::try_from(row).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData("total hits")));
    }
}
