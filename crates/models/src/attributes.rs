use crate::{LegacyMods, Ruleset};
use serde::{Deserialize, Serialize};

/// Well-known attribute identifiers of stored difficulty attributes.
///
/// Which of them are present depends on the ruleset the attributes were
/// calculated for.
pub mod attrib {
    pub const AIM: u16 = 1;
    pub const SPEED: u16 = 3;
    pub const OVERALL_DIFFICULTY: u16 = 5;
    pub const APPROACH_RATE: u16 = 7;
    pub const MAX_COMBO: u16 = 9;
    pub const STAR_RATING: u16 = 11;
    pub const GREAT_HIT_WINDOW: u16 = 13;
    pub const SCORE_MULTIPLIER: u16 = 15;
    pub const FLASHLIGHT: u16 = 17;
    pub const SLIDER_FACTOR: u16 = 19;
    pub const SPEED_NOTE_COUNT: u16 = 21;
}

/// Cache index of a difficulty attribute set.
///
/// Two keys are equal iff all three fields match exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DifficultyAttributeKey {
    pub beatmap_id: u32,
    pub ruleset: Ruleset,
    pub mods: LegacyMods,
}
impl DifficultyAttributeKey {
    pub fn new(beatmap_id: u32, ruleset: Ruleset, mods: LegacyMods) -> Self {
        Self { beatmap_id, ruleset, mods }
    }
}

/// Ordered `(attribute id, value)` pairs describing the difficulty of one
/// beatmap for one ruleset and mod combination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DifficultyAttributes {
    values: Vec<(u16, f32)>,
}
impl DifficultyAttributes {
    pub fn new(values: impl IntoIterator<Item = (u16, f32)>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Value of the first pair carrying `attribute_id`.
    pub fn get(&self, attribute_id: u16) -> Option<f32> {
        self.values.iter().find(|(id, _)| *id == attribute_id).map(|(_, value)| *value)
    }

    pub fn star_rating(&self) -> Option<f32> {
        self.get(attrib::STAR_RATING)
    }

    pub fn max_combo(&self) -> Option<u32> {
        // Stored as a float like every other attribute.
        self.get(attrib::MAX_COMBO).map(|combo| combo.max(0.0).round() as u32)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(u16, f32)> {
        self.values.iter()
    }
}
impl FromIterator<(u16, f32)> for DifficultyAttributes {
    fn from_iter<I: IntoIterator<Item = (u16, f32)>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_equality_is_by_field() {
        let a = DifficultyAttributeKey::new(1, Ruleset::Osu, LegacyMods::HARD_ROCK);
        let b = DifficultyAttributeKey::new(1, Ruleset::Osu, LegacyMods::HARD_ROCK);
        let c = DifficultyAttributeKey::new(1, Ruleset::Taiko, LegacyMods::HARD_ROCK);
        assert_eq!(a, b);
        assert_ne!(a, c);
        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_accessors() {
        let attributes: DifficultyAttributes =
            [(attrib::AIM, 2.5), (attrib::MAX_COMBO, 1337.0), (attrib::STAR_RATING, 5.25)].into_iter().collect();
        assert_eq!(attributes.len(), 3);
        assert_eq!(attributes.star_rating(), Some(5.25));
        assert_eq!(attributes.max_combo(), Some(1337));
        assert_eq!(attributes.get(attrib::FLASHLIGHT), None);
        assert!(DifficultyAttributes::default().is_empty());
    }
}
