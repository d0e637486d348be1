use crate::cache::AttributeCache;
use crate::calculator::{DifficultyCalculator, calculate_blocking};
use crate::content::ContentSource;
use crate::eligibility::{self, Blacklist};
use crate::error::{ErrorKind, Result};
use crate::mods::{AcronymConverter, LegacyModConverter, lookup_mods};
use crate::source::BeatmapRecords;
use scorestats_models::{Beatmap, DifficultyAttributeKey, DifficultyAttributes, Mod, Ruleset};
use std::sync::Arc;
use tracing::{debug, info, instrument};

struct Realtime {
    content: Arc<dyn ContentSource>,
    calculator: Arc<dyn DifficultyCalculator>,
}

/// Resolves beatmaps and difficulty attributes for score processing, and
/// decides whether a beatmap may award performance.
///
/// One store is shared (behind an [`Arc`]) by everything processing scores
/// in this process; its cache and blacklist are per instance.
pub struct BeatmapStore {
    records: Arc<dyn BeatmapRecords>,
    cache: AttributeCache,
    blacklist: Blacklist,
    converter: Arc<dyn LegacyModConverter>,
    realtime: Option<Realtime>,
}

impl BeatmapStore {
    /// Create a store, loading the performance blacklist from `records`.
    ///
    /// Fails with [`BlacklistUnavailable`](ErrorKind::BlacklistUnavailable)
    /// if the blacklist can't be loaded; a store must never run without it.
    #[instrument(skip(records))]
    pub async fn create(records: Arc<dyn BeatmapRecords>) -> Result<Self> {
        let rows = records.blacklist().await.map_err(|err| err.raise(ErrorKind::BlacklistUnavailable))?;
        info!(entries = rows.len(), "loaded performance blacklist");
        Ok(Self::from_blacklist(records, rows))
    }

    /// Create a store from blacklist rows that are already at hand.
    pub fn from_blacklist(records: Arc<dyn BeatmapRecords>, blacklist: impl IntoIterator<Item = (u32, Ruleset)>) -> Self {
        Self {
            records,
            cache: AttributeCache::new(),
            blacklist: blacklist.into_iter().collect(),
            converter: Arc::new(AcronymConverter),
            realtime: None,
        }
    }

    /// Replace the converter used to turn native mods into legacy bits.
    pub fn with_converter(mut self, converter: Arc<dyn LegacyModConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Calculate difficulty attributes on demand instead of looking up
    /// precomputed ones. Calculated attributes are never cached.
    pub fn with_realtime_difficulty(
        mut self,
        content: Arc<dyn ContentSource>,
        calculator: Arc<dyn DifficultyCalculator>,
    ) -> Self {
        self.realtime = Some(Realtime { content, calculator });
        self
    }

    pub fn is_realtime(&self) -> bool {
        self.realtime.is_some()
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }

    pub fn cache(&self) -> &AttributeCache {
        &self.cache
    }

    /// Beatmap with id `beatmap_id`, or `None` if it doesn't exist.
    ///
    /// Storage is queried at most once per id for the lifetime of the store
    /// (or until [`invalidate_beatmap`](Self::invalidate_beatmap)).
    #[instrument(level = "debug", skip(self))]
    pub async fn get_beatmap(&self, beatmap_id: u32) -> Result<Option<Arc<Beatmap>>> {
        self.cache.beatmap(beatmap_id, || self.records.beatmap(beatmap_id)).await
    }

    /// Difficulty attributes applying to a score on `beatmap` played in
    /// `ruleset` with `mods`.
    ///
    /// `None` means no attributes are stored for that combination, which
    /// only happens for lookups of precomputed attributes.
    #[instrument(level = "debug", skip_all, fields(beatmap_id = beatmap.id, %ruleset))]
    pub async fn get_difficulty_attributes(
        &self,
        beatmap: &Beatmap,
        ruleset: Ruleset,
        mods: &[Mod],
    ) -> Result<Option<Arc<DifficultyAttributes>>> {
        if let Some(realtime) = &self.realtime {
            let content = realtime.content.content(beatmap.id).await?;
            if content.is_empty() {
                exn::bail!(ErrorKind::ContentUnavailable(beatmap.id));
            }
            let attributes =
                calculate_blocking(realtime.calculator.clone(), ruleset, content, mods.to_vec()).await?;
            return Ok(Some(Arc::new(attributes)));
        }

        let key = DifficultyAttributeKey::new(beatmap.id, ruleset, lookup_mods(&*self.converter, beatmap, ruleset, mods));
        debug!(mods = %key.mods, "looking up stored difficulty attributes");
        self.cache.attributes(key, || async move { self.records.difficulty_attributes(&key).await }).await
    }

    /// Whether scores on `beatmap` in `ruleset` may award performance.
    pub fn is_valid_for_performance(&self, beatmap: &Beatmap, ruleset: Ruleset) -> bool {
        eligibility::is_valid_for_performance(beatmap, ruleset, &self.blacklist)
    }

    /// Forget everything cached about `beatmap_id`, so the next lookup reads
    /// storage again. For operators after beatmap data changed.
    pub fn invalidate_beatmap(&self, beatmap_id: u32) {
        info!(beatmap_id, "invalidating cached beatmap data");
        self.cache.invalidate_beatmap(beatmap_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MockContentSource;
    use crate::source::MockRecords;
    use scorestats_models::{ApprovalStatus, LegacyMods, attrib};

    fn beatmap(id: u32, ruleset: Ruleset, status: ApprovalStatus) -> Beatmap {
        Beatmap {
            id,
            beatmapset_id: id,
            ruleset,
            status,
            checksum: None,
        }
    }

    fn attributes(star_rating: f32) -> DifficultyAttributes {
        DifficultyAttributes::new([(attrib::STAR_RATING, star_rating)])
    }

    struct ByteCountCalculator;
    impl DifficultyCalculator for ByteCountCalculator {
        fn calculate(&self, _ruleset: Ruleset, content: &[u8], _mods: &[Mod]) -> Result<DifficultyAttributes> {
            Ok(attributes(content.len() as f32))
        }
    }

    #[tokio::test]
    async fn test_create_loads_blacklist() {
        let records = Arc::new(MockRecords::default().with_blacklisted(5, Ruleset::Osu));
        let store = BeatmapStore::create(records).await.unwrap();
        assert!(store.blacklist().contains(5, Ruleset::Osu));
        assert!(!store.is_valid_for_performance(&beatmap(5, Ruleset::Osu, ApprovalStatus::Ranked), Ruleset::Osu));
    }

    #[tokio::test]
    async fn test_create_fails_without_blacklist() {
        let records = MockRecords::default();
        records.set_unavailable(true);
        let err = BeatmapStore::create(Arc::new(records)).await.err().unwrap();
        assert_eq!(*err, ErrorKind::BlacklistUnavailable);
    }

    #[tokio::test]
    async fn test_get_beatmap_queries_storage_once() {
        let records = Arc::new(MockRecords::with_beatmaps([beatmap(1, Ruleset::Osu, ApprovalStatus::Ranked)]));
        let store = BeatmapStore::from_blacklist(records.clone(), []);

        let first = store.get_beatmap(1).await.unwrap().unwrap();
        let second = store.get_beatmap(1).await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(store.get_beatmap(2).await.unwrap().is_none());
        assert!(store.get_beatmap(2).await.unwrap().is_none());
        assert_eq!(records.beatmap_queries(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let records = Arc::new(MockRecords::with_beatmaps([beatmap(1, Ruleset::Osu, ApprovalStatus::Ranked)]));
        let store = BeatmapStore::from_blacklist(records.clone(), []);

        records.set_unavailable(true);
        let err = store.get_beatmap(1).await.unwrap_err();
        assert_eq!(*err, ErrorKind::TransientFetchFailure);

        records.set_unavailable(false);
        assert!(store.get_beatmap(1).await.unwrap().is_some());
        assert_eq!(records.beatmap_queries(), 2);
    }

    #[tokio::test]
    async fn test_attributes_use_mapped_mods_and_cache() {
        let map = beatmap(1, Ruleset::Osu, ApprovalStatus::Ranked);
        let key = DifficultyAttributeKey::new(1, Ruleset::Osu, LegacyMods::DOUBLE_TIME);
        let records = Arc::new(MockRecords::with_beatmaps([map.clone()]).with_attributes(key, attributes(6.5)));
        let store = BeatmapStore::from_blacklist(records.clone(), []);

        // NC maps onto DT, HD is irrelevant without FL.
        let mods = [Mod::new("NC"), Mod::new("HD")];
        let found = store.get_difficulty_attributes(&map, Ruleset::Osu, &mods).await.unwrap().unwrap();
        assert_eq!(found.star_rating(), Some(6.5));
        let again = store.get_difficulty_attributes(&map, Ruleset::Osu, &[Mod::new("DT")]).await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&found, &again));
        assert_eq!(records.attribute_queries(), 1);
    }

    #[tokio::test]
    async fn test_missing_attributes_cached_as_absent() {
        let map = beatmap(1, Ruleset::Osu, ApprovalStatus::Ranked);
        let records = Arc::new(MockRecords::with_beatmaps([map.clone()]));
        let store = BeatmapStore::from_blacklist(records.clone(), []);

        assert!(store.get_difficulty_attributes(&map, Ruleset::Osu, &[]).await.unwrap().is_none());
        assert!(store.get_difficulty_attributes(&map, Ruleset::Osu, &[]).await.unwrap().is_none());
        assert_eq!(records.attribute_queries(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_beatmap_refetches() {
        let map = beatmap(1, Ruleset::Osu, ApprovalStatus::Ranked);
        let records = Arc::new(MockRecords::with_beatmaps([map.clone()]));
        let store = BeatmapStore::from_blacklist(records.clone(), []);

        store.get_beatmap(1).await.unwrap();
        store.get_difficulty_attributes(&map, Ruleset::Osu, &[]).await.unwrap();
        store.invalidate_beatmap(1);
        store.get_beatmap(1).await.unwrap();
        store.get_difficulty_attributes(&map, Ruleset::Osu, &[]).await.unwrap();
        assert_eq!(records.beatmap_queries(), 2);
        assert_eq!(records.attribute_queries(), 2);
    }

    #[tokio::test]
    async fn test_realtime_difficulty() {
        let map = beatmap(1, Ruleset::Osu, ApprovalStatus::Ranked);
        let records = Arc::new(MockRecords::with_beatmaps([map.clone()]));
        let content = Arc::new(MockContentSource::with_files([(1, b"0123456789".to_vec())]));
        let store = BeatmapStore::from_blacklist(records.clone(), [])
            .with_realtime_difficulty(content.clone(), Arc::new(ByteCountCalculator));
        assert!(store.is_realtime());

        for _ in 0..2 {
            let found = store.get_difficulty_attributes(&map, Ruleset::Osu, &[]).await.unwrap().unwrap();
            assert_eq!(found.star_rating(), Some(10.0));
        }
        // Calculated attributes bypass both storage and the cache.
        assert_eq!(content.reads(), 2);
        assert_eq!(records.attribute_queries(), 0);
    }

    #[tokio::test]
    async fn test_realtime_without_content_fails() {
        let map = beatmap(2, Ruleset::Osu, ApprovalStatus::Ranked);
        let store = BeatmapStore::from_blacklist(Arc::new(MockRecords::default()), [])
            .with_realtime_difficulty(Arc::new(MockContentSource::default()), Arc::new(ByteCountCalculator));

        let err = store.get_difficulty_attributes(&map, Ruleset::Osu, &[]).await.unwrap_err();
        assert_eq!(*err, ErrorKind::ContentUnavailable(2));
    }

    #[tokio::test]
    async fn test_eligibility_uses_store_blacklist() {
        let store = BeatmapStore::from_blacklist(Arc::new(MockRecords::default()), [(1, Ruleset::Mania)]);
        let ranked = beatmap(1, Ruleset::Osu, ApprovalStatus::Ranked);
        assert!(store.is_valid_for_performance(&ranked, Ruleset::Osu));
        assert!(!store.is_valid_for_performance(&ranked, Ruleset::Mania));
        assert!(!store.is_valid_for_performance(&beatmap(2, Ruleset::Osu, ApprovalStatus::Loved), Ruleset::Osu));
    }
}
