use crate::error::{Error, ErrorKind};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Game mode a score was set in, or a beatmap was authored for.
///
/// The numeric id is what storage and the queue payloads carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ruleset {
    Osu,
    Taiko,
    Catch,
    Mania,
}
impl Ruleset {
    pub const ALL: [Ruleset; 4] = [Ruleset::Osu, Ruleset::Taiko, Ruleset::Catch, Ruleset::Mania];

    /// Online identifier of the ruleset.
    pub fn id(&self) -> u8 {
        match self {
            Ruleset::Osu => 0,
            Ruleset::Taiko => 1,
            Ruleset::Catch => 2,
            Ruleset::Mania => 3,
        }
    }

    /// Short name as used in URLs and logs.
    pub fn short_name(&self) -> &'static str {
        match self {
            Ruleset::Osu => "osu",
            Ruleset::Taiko => "taiko",
            Ruleset::Catch => "fruits",
            Ruleset::Mania => "mania",
        }
    }
}
impl TryFrom<u8> for Ruleset {
    type Error = Error;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Osu,
            1 => Self::Taiko,
            2 => Self::Catch,
            3 => Self::Mania,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "ruleset",
                value: value.to_string(),
            }),
        })
    }
}
impl TryFrom<i64> for Ruleset {
    type Error = Error;
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let Ok(id) = u8::try_from(value) else {
            exn::bail!(ErrorKind::ParseError {
                field: "ruleset",
                value: value.to_string(),
            });
        };
        Self::try_from(id)
    }
}
impl From<Ruleset> for u8 {
    fn from(ruleset: Ruleset) -> Self {
        ruleset.id()
    }
}
impl From<Ruleset> for i64 {
    fn from(ruleset: Ruleset) -> Self {
        i64::from(ruleset.id())
    }
}
impl Serialize for Ruleset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.id())
    }
}
impl<'de> Deserialize<'de> for Ruleset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = u8::deserialize(deserializer)?;
        Self::try_from(id).map_err(|_| D::Error::custom(format!("unknown ruleset id {id}")))
    }
}
impl FromStr for Ruleset {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "0" | "osu" | "standard" => Self::Osu,
            "1" | "taiko" => Self::Taiko,
            "2" | "fruits" | "catch" | "ctb" => Self::Catch,
            "3" | "mania" => Self::Mania,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "ruleset",
                value: s.to_string(),
            }),
        })
    }
}
impl Display for Ruleset {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("osu", Ruleset::Osu)]
    #[case("2", Ruleset::Catch)]
    #[case("ctb", Ruleset::Catch)]
    #[case(" Mania ", Ruleset::Mania)]
    fn test_from_str(#[case] input: &str, #[case] expected: Ruleset) {
        assert_eq!(input.parse::<Ruleset>().unwrap(), expected);
    }

    #[test]
    fn test_id_roundtrip_through_storage_type() {
        for ruleset in Ruleset::ALL {
            assert_eq!(Ruleset::try_from(i64::from(ruleset)).unwrap(), ruleset);
        }
    }

    #[test]
    fn test_unknown_ids_rejected() {
        assert!(Ruleset::try_from(4u8).is_err());
        assert!(Ruleset::try_from(-1i64).is_err());
        assert!("catch the beat".parse::<Ruleset>().is_err());
    }
}
