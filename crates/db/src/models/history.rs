use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use scorestats_models::ProcessHistory;
use time::OffsetDateTime;

#[derive(sqlx::FromRow)]
pub(crate) struct HistoryRow {
    pub(crate) score_id: i64,
    pub(crate) processed_version: i64,
    pub(crate) processed_at: i64,
}
impl TryFrom<&ProcessHistory> for HistoryRow {
    type Error = Error;
    fn try_from(history: &ProcessHistory) -> Result<Self, Self::Error> {
        Ok(Self {
            score_id: i64::try_from(history.score_id).or_raise(|| ErrorKind::InvalidData("score id"))?,
            processed_version: i64::from(history.processed_version),
            processed_at: history.processed_at.unix_timestamp(),
        })
    }
}
impl TryFrom<HistoryRow> for ProcessHistory {
    type Error = Error;
    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            score_id: u64::try_from(row.score_id).or_raise(|| ErrorKind::InvalidData("score id"))?,
            processed_version: u8::try_from(row.processed_version)
                .or_raise(|| ErrorKind::InvalidData("processed version"))?,
            processed_at: OffsetDateTime::from_unix_timestamp(row.processed_at)
                .or_raise(|| ErrorKind::InvalidData("processed at"))?,
        })
    }
}
