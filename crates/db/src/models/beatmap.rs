use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use scorestats_models::{ApprovalStatus, Beatmap, Ruleset};

#[derive(sqlx::FromRow)]
pub(crate) struct BeatmapRow {
    pub(crate) beatmap_id: i64,
    pub(crate) beatmapset_id: i64,
    pub(crate) playmode: i64,
    pub(crate) approved: i64,
    #[sqlx(default)]
    pub(crate) checksum: Option<String>,
}
impl From<&Beatmap> for BeatmapRow {
    fn from(beatmap: &Beatmap) -> Self {
        Self {
            beatmap_id: i64::from(beatmap.id),
            beatmapset_id: i64::from(beatmap.beatmapset_id),
            playmode: i64::from(beatmap.ruleset),
            approved: i64::from(beatmap.status),
            checksum: beatmap.checksum.clone(),
        }
    }
}
impl TryFrom<BeatmapRow> for Beatmap {
    type Error = Error;
    fn try_from(row: BeatmapRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: u32::try_from(row.beatmap_id).or_raise(|| ErrorKind::InvalidData("beatmap id"))?,
            beatmapset_id: u32::try_from(row.beatmapset_id).or_raise(|| ErrorKind::InvalidData("beatmapset id"))?,
            ruleset: Ruleset::try_from(row.playmode).or_raise(|| ErrorKind::InvalidData("playmode"))?,
            status: ApprovalStatus::try_from(row.approved).or_raise(|| ErrorKind::InvalidData("approved"))?,
            checksum: row.checksum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_to_model() {
        let row = BeatmapRow {
            beatmap_id: 129891,
            beatmapset_id: 39804,
            playmode: 0,
            approved: 1,
            checksum: Some("da8aae79c8f3306b5d65ec951874a7fb".to_string()),
        };
        let beatmap = Beatmap::try_from(row).unwrap();
        assert_eq!(beatmap.ruleset, Ruleset::Osu);
        assert_eq!(beatmap.status, ApprovalStatus::Ranked);
    }

    #[test]
    fn test_row_with_unknown_status_is_invalid() {
        let row = BeatmapRow {
            beatmap_id: 1,
            beatmapset_id: 1,
            playmode: 0,
            approved: 9,
            checksum: None,
        };
        let err = Beatmap::try_from(row).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData("approved")));
    }
}
