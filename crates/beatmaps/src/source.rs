use crate::error::{Error, ErrorKind, Result};
use async_trait::async_trait;
use scorestats_db::Repository;
use scorestats_models::{Beatmap, DifficultyAttributeKey, DifficultyAttributes, Ruleset};
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockRecords;

/// Read access to stored beatmap reference data.
///
/// "Not found" is a regular answer (`None`), never an error. Errors are
/// reserved for the store being unreachable or returning garbage.
#[async_trait]
pub trait BeatmapRecords: Send + Sync {
    async fn beatmap(&self, beatmap_id: u32) -> Result<Option<Beatmap>>;

    /// Precomputed attributes stored under exactly `key`.
    async fn difficulty_attributes(&self, key: &DifficultyAttributeKey) -> Result<Option<DifficultyAttributes>>;

    /// Every `(beatmap id, ruleset)` pair excluded from awarding performance.
    async fn blacklist(&self) -> Result<Vec<(u32, Ruleset)>>;
}

fn fetch_failure(err: scorestats_db::error::Error) -> Error {
    let kind = if err.is_retryable() { ErrorKind::TransientFetchFailure } else { ErrorKind::InvalidData };
    err.raise(kind)
}

#[async_trait]
impl BeatmapRecords for Repository {
    async fn beatmap(&self, beatmap_id: u32) -> Result<Option<Beatmap>> {
        self.get_beatmap(beatmap_id).await.map_err(fetch_failure)
    }

    async fn difficulty_attributes(&self, key: &DifficultyAttributeKey) -> Result<Option<DifficultyAttributes>> {
        let attributes = self.get_difficulty_attributes(key).await.map_err(fetch_failure)?;
        Ok((!attributes.is_empty()).then_some(attributes))
    }

    async fn blacklist(&self) -> Result<Vec<(u32, Ruleset)>> {
        self.list_blacklist().await.map_err(fetch_failure)
    }
}

#[cfg(any(test, feature = "mock"))]
mod mock {
    use super::BeatmapRecords;
    use crate::error::{ErrorKind, Result};
    use async_trait::async_trait;
    use scorestats_models::{Beatmap, DifficultyAttributeKey, DifficultyAttributes, Ruleset};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::RwLock;

    /// In-memory beatmap records for testing.
    ///
    /// Counts every query it answers so tests can assert on caching, and can
    /// be switched into an "unavailable" mode where every query fails with
    /// [`TransientFetchFailure`](ErrorKind::TransientFetchFailure).
    #[derive(Debug, Default)]
    pub struct MockRecords {
        beatmaps: RwLock<HashMap<u32, Beatmap>>,
        attributes: RwLock<HashMap<DifficultyAttributeKey, DifficultyAttributes>>,
        blacklist: RwLock<Vec<(u32, Ruleset)>>,
        beatmap_queries: AtomicUsize,
        attribute_queries: AtomicUsize,
        unavailable: AtomicBool,
    }

    impl MockRecords {
        pub fn with_beatmaps(beatmaps: impl IntoIterator<Item = Beatmap>) -> Self {
            let mut records = Self::default();
            *records.beatmaps.get_mut() = beatmaps.into_iter().map(|b| (b.id, b)).collect();
            records
        }

        pub fn with_attributes(mut self, key: DifficultyAttributeKey, attributes: DifficultyAttributes) -> Self {
            self.attributes.get_mut().insert(key, attributes);
            self
        }

        pub fn with_blacklisted(mut self, beatmap_id: u32, ruleset: Ruleset) -> Self {
            self.blacklist.get_mut().push((beatmap_id, ruleset));
            self
        }

        pub async fn insert_beatmap(&self, beatmap: Beatmap) {
            self.beatmaps.write().await.insert(beatmap.id, beatmap);
        }

        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        pub fn beatmap_queries(&self) -> usize {
            self.beatmap_queries.load(Ordering::SeqCst)
        }

        pub fn attribute_queries(&self) -> usize {
            self.attribute_queries.load(Ordering::SeqCst)
        }

        fn check_available(&self) -> Result<()> {
            if self.unavailable.load(Ordering::SeqCst) {
                exn::bail!(ErrorKind::TransientFetchFailure);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl BeatmapRecords for MockRecords {
        async fn beatmap(&self, beatmap_id: u32) -> Result<Option<Beatmap>> {
            self.beatmap_queries.fetch_add(1, Ordering::SeqCst);
            self.check_available()?;
            Ok(self.beatmaps.read().await.get(&beatmap_id).cloned())
        }

        async fn difficulty_attributes(&self, key: &DifficultyAttributeKey) -> Result<Option<DifficultyAttributes>> {
            self.attribute_queries.fetch_add(1, Ordering::SeqCst);
            self.check_available()?;
            Ok(self.attributes.read().await.get(key).cloned())
        }

        async fn blacklist(&self) -> Result<Vec<(u32, Ruleset)>> {
            self.check_available()?;
            Ok(self.blacklist.read().await.clone())
        }
    }
}
