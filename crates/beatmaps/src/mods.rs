//! Mapping of native mods onto the legacy lookup bitmask.
//!
//! Precomputed difficulty attributes are stored per legacy mod combination.
//! Looking them up for a score takes three steps:
//!
//! 1. Convert every native mod that exists in the legacy system
//!    ([`LegacyModConverter`]).
//! 2. Approximate mods with no legacy counterpart but a difficulty-equivalent
//!    one ([`APPROXIMATIONS`]).
//! 3. Drop every bit that doesn't affect difficulty in the score's ruleset
//!    ([`relevant_mods`]).
//!
//! The result depends only on (mods, ruleset, convert flag).

use scorestats_models::{Beatmap, LegacyMods, Mod, Ruleset};

const fn combine(a: LegacyMods, b: LegacyMods) -> LegacyMods {
    LegacyMods::from_bits(a.bits() | b.bits())
}

/// Native mods with no legacy representation, and the legacy bits that have
/// the same effect on difficulty.
pub const APPROXIMATIONS: &[(&str, LegacyMods)] = &[
    // Daycore slows playback exactly like half time, only without the pitch
    // correction.
    ("DC", LegacyMods::HALF_TIME),
];

/// Converts a ruleset's native mods into legacy bits.
///
/// Implementations are authoritative for mods that exist in the legacy
/// system and must ignore everything else.
pub trait LegacyModConverter: Send + Sync {
    fn convert(&self, ruleset: Ruleset, mods: &[Mod]) -> LegacyMods;
}

/// Converter matching mods by acronym.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcronymConverter;

const SHARED: &[(&str, LegacyMods)] = &[
    ("NF", LegacyMods::NO_FAIL),
    ("EZ", LegacyMods::EASY),
    ("HD", LegacyMods::HIDDEN),
    ("HR", LegacyMods::HARD_ROCK),
    ("SD", LegacyMods::SUDDEN_DEATH),
    ("PF", combine(LegacyMods::SUDDEN_DEATH, LegacyMods::PERFECT)),
    ("DT", LegacyMods::DOUBLE_TIME),
    ("NC", combine(LegacyMods::DOUBLE_TIME, LegacyMods::NIGHTCORE)),
    ("HT", LegacyMods::HALF_TIME),
    ("FL", LegacyMods::FLASHLIGHT),
    ("AT", LegacyMods::AUTOPLAY),
    ("CN", LegacyMods::CINEMA),
    ("RX", LegacyMods::RELAX),
    ("SV2", LegacyMods::SCORE_V2),
];

const OSU: &[(&str, LegacyMods)] = &[
    ("TD", LegacyMods::TOUCH_DEVICE),
    ("SO", LegacyMods::SPUN_OUT),
    ("AP", LegacyMods::AUTOPILOT),
    ("TP", LegacyMods::TARGET),
];

const MANIA: &[(&str, LegacyMods)] = &[
    ("FI", LegacyMods::FADE_IN),
    ("RD", LegacyMods::RANDOM),
    ("MR", LegacyMods::MIRROR),
    ("DS", LegacyMods::KEY_COOP),
    ("1K", LegacyMods::KEY1),
    ("2K", LegacyMods::KEY2),
    ("3K", LegacyMods::KEY3),
    ("4K", LegacyMods::KEY4),
    ("5K", LegacyMods::KEY5),
    ("6K", LegacyMods::KEY6),
    ("7K", LegacyMods::KEY7),
    ("8K", LegacyMods::KEY8),
    ("9K", LegacyMods::KEY9),
];

impl AcronymConverter {
    fn ruleset_table(ruleset: Ruleset) -> &'static [(&'static str, LegacyMods)] {
        match ruleset {
            Ruleset::Osu => OSU,
            Ruleset::Mania => MANIA,
            Ruleset::Taiko | Ruleset::Catch => &[],
        }
    }
}
impl LegacyModConverter for AcronymConverter {
    fn convert(&self, ruleset: Ruleset, mods: &[Mod]) -> LegacyMods {
        let specific = Self::ruleset_table(ruleset);
        mods.iter()
            .filter_map(|m| SHARED.iter().chain(specific).find(|(acronym, _)| m.is(acronym)))
            .fold(LegacyMods::NONE, |acc, (_, bits)| acc | *bits)
    }
}

/// Legacy bits for every mod in `mods` listed in [`APPROXIMATIONS`].
pub fn approximate(mods: &[Mod]) -> LegacyMods {
    mods.iter()
        .filter_map(|m| APPROXIMATIONS.iter().find(|(acronym, _)| m.is(acronym)))
        .fold(LegacyMods::NONE, |acc, (_, bits)| acc | *bits)
}

/// Reduce `mods` to the bits that affect difficulty in `ruleset`.
///
/// `is_convert` is set when the score's ruleset differs from the beatmap's
/// own: key count only changes difficulty of converted mania beatmaps.
pub fn relevant_mods(mods: LegacyMods, ruleset: Ruleset, is_convert: bool) -> LegacyMods {
    let mut relevant = LegacyMods::DOUBLE_TIME | LegacyMods::HALF_TIME | LegacyMods::HARD_ROCK | LegacyMods::EASY;
    match ruleset {
        Ruleset::Osu => {
            relevant |= LegacyMods::FLASHLIGHT | LegacyMods::TOUCH_DEVICE;
            // Hidden only matters to the flashlight skill.
            if mods.contains(LegacyMods::FLASHLIGHT) {
                relevant |= LegacyMods::HIDDEN;
            }
        },
        Ruleset::Mania if is_convert => relevant |= LegacyMods::KEY_MODS,
        Ruleset::Mania | Ruleset::Taiko | Ruleset::Catch => {},
    }
    mods & relevant
}

/// Legacy mod mask to look up stored attributes of `beatmap` for a score in
/// `ruleset` with `mods`.
pub fn lookup_mods(converter: &dyn LegacyModConverter, beatmap: &Beatmap, ruleset: Ruleset, mods: &[Mod]) -> LegacyMods {
    let legacy = converter.convert(ruleset, mods) | approximate(mods);
    relevant_mods(legacy, ruleset, beatmap.is_convert_for(ruleset))
}
