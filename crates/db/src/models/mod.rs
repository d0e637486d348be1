mod beatmap;
mod history;
mod score;
mod statistics;

pub(crate) use self::beatmap::BeatmapRow;
pub(crate) use self::history::HistoryRow;
pub(crate) use self::score::ScoreRow;
pub(crate) use self::statistics::UserStatisticsRow;
