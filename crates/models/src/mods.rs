use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// A ruleset-native mod as submitted with a score.
///
/// Mods are identified by their acronym (`"HD"`, `"DT"`, `"DC"`, ...). Any
/// customisation the player applied travels along in `settings`; it is kept
/// verbatim but never interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mod {
    pub acronym: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub settings: Map<String, Value>,
}
impl Mod {
    pub fn new(acronym: impl Into<String>) -> Self {
        Self {
            acronym: acronym.into(),
            settings: Map::new(),
        }
    }

    /// Case-insensitive acronym comparison.
    pub fn is(&self, acronym: &str) -> bool {
        self.acronym.eq_ignore_ascii_case(acronym)
    }
}

/// Mod bitmask of the legacy scoring system.
///
/// Only used as a lookup key for precomputed difficulty data; it carries no
/// gameplay semantics of its own.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegacyMods(u32);

impl LegacyMods {
    pub const NONE: Self = Self(0);
    pub const NO_FAIL: Self = Self(1 << 0);
    pub const EASY: Self = Self(1 << 1);
    pub const TOUCH_DEVICE: Self = Self(1 << 2);
    pub const HIDDEN: Self = Self(1 << 3);
    pub const HARD_ROCK: Self = Self(1 << 4);
    pub const SUDDEN_DEATH: Self = Self(1 << 5);
    pub const DOUBLE_TIME: Self = Self(1 << 6);
    pub const RELAX: Self = Self(1 << 7);
    pub const HALF_TIME: Self = Self(1 << 8);
    /// Always set together with [`DOUBLE_TIME`](Self::DOUBLE_TIME).
    pub const NIGHTCORE: Self = Self(1 << 9);
    pub const FLASHLIGHT: Self = Self(1 << 10);
    pub const AUTOPLAY: Self = Self(1 << 11);
    pub const SPUN_OUT: Self = Self(1 << 12);
    pub const AUTOPILOT: Self = Self(1 << 13);
    /// Always set together with [`SUDDEN_DEATH`](Self::SUDDEN_DEATH).
    pub const PERFECT: Self = Self(1 << 14);
    pub const KEY4: Self = Self(1 << 15);
    pub const KEY5: Self = Self(1 << 16);
    pub const KEY6: Self = Self(1 << 17);
    pub const KEY7: Self = Self(1 << 18);
    pub const KEY8: Self = Self(1 << 19);
    pub const FADE_IN: Self = Self(1 << 20);
    pub const RANDOM: Self = Self(1 << 21);
    pub const CINEMA: Self = Self(1 << 22);
    pub const TARGET: Self = Self(1 << 23);
    pub const KEY9: Self = Self(1 << 24);
    pub const KEY_COOP: Self = Self(1 << 25);
    pub const KEY1: Self = Self(1 << 26);
    pub const KEY3: Self = Self(1 << 27);
    pub const KEY2: Self = Self(1 << 28);
    pub const SCORE_V2: Self = Self(1 << 29);
    pub const MIRROR: Self = Self(1 << 30);

    /// Every mania key-count mod, including co-op.
    pub const KEY_MODS: Self = Self(
        Self::KEY1.0
            | Self::KEY2.0
            | Self::KEY3.0
            | Self::KEY4.0
            | Self::KEY5.0
            | Self::KEY6.0
            | Self::KEY7.0
            | Self::KEY8.0
            | Self::KEY9.0
            | Self::KEY_COOP.0,
    );

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit of `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if any bit of `other` is set.
    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}
impl BitOr for LegacyMods {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}
impl BitOrAssign for LegacyMods {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
impl BitAnd for LegacyMods {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}
impl Not for LegacyMods {
    type Output = Self;
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}
impl From<LegacyMods> for i64 {
    fn from(mods: LegacyMods) -> Self {
        i64::from(mods.0)
    }
}
impl Display for LegacyMods {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_operations() {
        let mods = LegacyMods::DOUBLE_TIME | LegacyMods::NIGHTCORE;
        assert_eq!(mods.bits(), 576);
        assert!(mods.contains(LegacyMods::DOUBLE_TIME));
        assert!(!mods.contains(LegacyMods::DOUBLE_TIME | LegacyMods::HIDDEN));
        assert!(mods.intersects(LegacyMods::DOUBLE_TIME | LegacyMods::HIDDEN));
        assert_eq!(mods & !LegacyMods::NIGHTCORE, LegacyMods::DOUBLE_TIME);
    }

    #[test]
    fn test_key_mods_cover_every_key_bit() {
        assert!(LegacyMods::KEY_MODS.contains(LegacyMods::KEY1 | LegacyMods::KEY9 | LegacyMods::KEY_COOP));
        assert!(!LegacyMods::KEY_MODS.intersects(LegacyMods::HARD_ROCK));
    }

    #[test]
    fn test_mod_serialization_skips_empty_settings() {
        let json = serde_json::to_string(&Mod::new("HD")).unwrap();
        assert_eq!(json, r#"{"acronym":"HD"}"#);
        let parsed: Mod = serde_json::from_str(r#"{"acronym":"DT","settings":{"speed_change":1.25}}"#).unwrap();
        assert!(parsed.is("dt"));
        assert_eq!(parsed.settings.len(), 1);
    }
}
