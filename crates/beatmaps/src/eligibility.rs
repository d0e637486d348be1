//! Whether a beatmap may award performance points.

use scorestats_models::{ApprovalStatus, Beatmap, Ruleset};
use std::collections::HashSet;

/// `(beatmap id, ruleset)` pairs excluded from awarding performance,
/// regardless of approval status.
///
/// Loaded once when the store is constructed and immutable afterwards.
#[derive(Debug, Default, Clone)]
pub struct Blacklist(HashSet<(u32, Ruleset)>);

impl Blacklist {
    pub fn contains(&self, beatmap_id: u32, ruleset: Ruleset) -> bool {
        self.0.contains(&(beatmap_id, ruleset))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
impl FromIterator<(u32, Ruleset)> for Blacklist {
    fn from_iter<I: IntoIterator<Item = (u32, Ruleset)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A beatmap is eligible iff it isn't blacklisted for `ruleset` and is
/// either Ranked or Approved. Loved, Qualified, Pending, WIP and Graveyard
/// beatmaps never award performance.
pub fn is_valid_for_performance(beatmap: &Beatmap, ruleset: Ruleset, blacklist: &Blacklist) -> bool {
    if blacklist.contains(beatmap.id, ruleset) {
        return false;
    }
    match beatmap.status {
        ApprovalStatus::Ranked | ApprovalStatus::Approved => true,
        ApprovalStatus::Graveyard
        | ApprovalStatus::Wip
        | ApprovalStatus::Pending
        | ApprovalStatus::Qualified
        | ApprovalStatus::Loved => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn beatmap(id: u32, status: ApprovalStatus) -> Beatmap {
        Beatmap {
            id,
            beatmapset_id: id,
            ruleset: Ruleset::Osu,
            status,
            checksum: None,
        }
    }

    #[rstest]
    #[case(ApprovalStatus::Ranked, true)]
    #[case(ApprovalStatus::Approved, true)]
    #[case(ApprovalStatus::Qualified, false)]
    #[case(ApprovalStatus::Loved, false)]
    #[case(ApprovalStatus::Pending, false)]
    #[case(ApprovalStatus::Wip, false)]
    #[case(ApprovalStatus::Graveyard, false)]
    fn test_status_eligibility(#[case] status: ApprovalStatus, #[case] expected: bool) {
        let blacklist = Blacklist::default();
        assert_eq!(is_valid_for_performance(&beatmap(1, status), Ruleset::Osu, &blacklist), expected);
    }

    #[test]
    fn test_blacklist_overrides_status_per_ruleset() {
        let blacklist: Blacklist = [(1, Ruleset::Taiko)].into_iter().collect();
        let ranked = beatmap(1, ApprovalStatus::Ranked);
        assert!(!is_valid_for_performance(&ranked, Ruleset::Taiko, &blacklist));
        assert!(is_valid_for_performance(&ranked, Ruleset::Osu, &blacklist));
        assert!(is_valid_for_performance(&beatmap(2, ApprovalStatus::Ranked), Ruleset::Taiko, &blacklist));
    }
}
