//! Beatmap and difficulty attribute resolution.
//!
//! [`BeatmapStore`] answers the two questions score processing has about a
//! beatmap: which difficulty attributes apply to a score, and whether the
//! beatmap may award performance at all.
//!
//! # Architecture
//! - [`mods`]: converts a score's native mods into the legacy bitmask that
//!   precomputed attributes are keyed by.
//! - [`eligibility`]: blacklist plus approval status check.
//! - [`AttributeCache`]: memoizes beatmaps and attribute sets, including
//!   the fact that nothing was found.
//! - [`BeatmapRecords`], [`ContentSource`] and [`DifficultyCalculator`]: the
//!   seams to storage, beatmap files and difficulty algorithms.

mod cache;
mod calculator;
mod content;
pub mod eligibility;
pub mod error;
pub mod mods;
mod source;
mod store;

pub use crate::cache::AttributeCache;
pub use crate::calculator::DifficultyCalculator;
#[cfg(any(test, feature = "mock"))]
pub use crate::content::MockContentSource;
pub use crate::content::{ContentSource, LocalContentSource};
pub use crate::eligibility::Blacklist;
#[cfg(any(test, feature = "mock"))]
pub use crate::source::MockRecords;
pub use crate::source::BeatmapRecords;
pub use crate::store::BeatmapStore;
