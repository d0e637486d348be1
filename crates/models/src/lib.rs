//! Domain types shared by every scorestats crate.
//!
//! Nothing in here performs I/O. The types describe what travels through the
//! score queue ([`ScoreItem`]), what is read from storage ([`Beatmap`],
//! [`DifficultyAttributes`]) and the keys used to cache the latter
//! ([`DifficultyAttributeKey`]).

mod attributes;
mod beatmap;
pub mod error;
mod mods;
mod ruleset;
mod score;
mod statistics;

pub use crate::attributes::{DifficultyAttributeKey, DifficultyAttributes, attrib};
pub use crate::beatmap::{ApprovalStatus, Beatmap};
pub use crate::mods::{LegacyMods, Mod};
pub use crate::ruleset::Ruleset;
pub use crate::score::{ProcessHistory, Score, ScoreItem};
pub use crate::statistics::{MAX_WEIGHTED_PLAYS, PERFORMANCE_WEIGHT_DECAY, UserStatistics};
