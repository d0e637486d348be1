use crate::Ruleset;
use crate::error::{Error, ErrorKind};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Ranking state of a beatmap.
///
/// Stored as the signed `approved` column: graveyard and work-in-progress maps
/// are negative, everything that went through ranking is positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApprovalStatus {
    Graveyard,
    Wip,
    Pending,
    Ranked,
    Approved,
    Qualified,
    Loved,
}
impl ApprovalStatus {
    pub fn id(&self) -> i8 {
        match self {
            ApprovalStatus::Graveyard => -2,
            ApprovalStatus::Wip => -1,
            ApprovalStatus::Pending => 0,
            ApprovalStatus::Ranked => 1,
            ApprovalStatus::Approved => 2,
            ApprovalStatus::Qualified => 3,
            ApprovalStatus::Loved => 4,
        }
    }

    /// Whether scores on beatmaps in this state count towards ranked score.
    pub fn is_ranked(&self) -> bool {
        matches!(self, ApprovalStatus::Ranked | ApprovalStatus::Approved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Graveyard => "graveyard",
            ApprovalStatus::Wip => "wip",
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Ranked => "ranked",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Qualified => "qualified",
            ApprovalStatus::Loved => "loved",
        }
    }
}
impl TryFrom<i64> for ApprovalStatus {
    type Error = Error;
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Ok(match value {
            -2 => Self::Graveyard,
            -1 => Self::Wip,
            0 => Self::Pending,
            1 => Self::Ranked,
            2 => Self::Approved,
            3 => Self::Qualified,
            4 => Self::Loved,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "approved",
                value: value.to_string(),
            }),
        })
    }
}
impl From<ApprovalStatus> for i64 {
    fn from(status: ApprovalStatus) -> Self {
        i64::from(status.id())
    }
}
impl Serialize for ApprovalStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.id())
    }
}
impl<'de> Deserialize<'de> for ApprovalStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = i8::deserialize(deserializer)?;
        Self::try_from(i64::from(id)).map_err(|_| D::Error::custom(format!("unknown approval status {id}")))
    }
}
impl Display for ApprovalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// A single difficulty of a beatmap set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beatmap {
    pub id: u32,
    pub beatmapset_id: u32,
    /// Ruleset the beatmap was authored for. Scores set in any other ruleset
    /// are played on a conversion of this beatmap.
    pub ruleset: Ruleset,
    pub status: ApprovalStatus,
    #[serde(default)]
    pub checksum: Option<String>,
}
impl Beatmap {
    /// Whether a score in `ruleset` is played on a converted version of this
    /// beatmap.
    pub fn is_convert_for(&self, ruleset: Ruleset) -> bool {
        self.ruleset != ruleset
    }
}
