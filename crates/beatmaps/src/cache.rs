use crate::error::Result;
use dashmap::DashMap;
use scorestats_models::{Beatmap, DifficultyAttributeKey, DifficultyAttributes};
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Resolution result shared between every caller asking for the same key.
///
/// `Some(None)` inside the cell records that the record does not exist.
type Slot<V> = Arc<OnceCell<Option<Arc<V>>>>;

/// Process-wide memo of beatmaps and difficulty attribute sets.
///
/// Each key is resolved at most once, even when many tasks ask for it at the
/// same time: the first caller runs the fetch while everyone else waits on
/// the same cell. Absence is cached just like a value. A fetch that fails
/// leaves the cell empty so the next caller tries again.
///
/// Entries live until [`invalidate_beatmap`](Self::invalidate_beatmap) or
/// [`clear`](Self::clear) is called; nothing expires on its own.
#[derive(Debug, Default)]
pub struct AttributeCache {
    beatmaps: DashMap<u32, Slot<Beatmap>>,
    attributes: DashMap<DifficultyAttributeKey, Slot<DifficultyAttributes>>,
}

impl AttributeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn beatmap<F, Fut>(&self, beatmap_id: u32, fetch: F) -> Result<Option<Arc<Beatmap>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Beatmap>>>,
    {
        resolve(&self.beatmaps, beatmap_id, fetch).await
    }

    pub async fn attributes<F, Fut>(
        &self,
        key: DifficultyAttributeKey,
        fetch: F,
    ) -> Result<Option<Arc<DifficultyAttributes>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<DifficultyAttributes>>>,
    {
        resolve(&self.attributes, key, fetch).await
    }

    /// Forget the beatmap and every attribute set belonging to it.
    ///
    /// Fetches already in flight complete against their own slot and are not
    /// re-inserted.
    pub fn invalidate_beatmap(&self, beatmap_id: u32) {
        self.beatmaps.remove(&beatmap_id);
        self.attributes.retain(|key, _| key.beatmap_id != beatmap_id);
    }

    pub fn clear(&self) {
        self.beatmaps.clear();
        self.attributes.clear();
    }

    /// Number of beatmap keys seen, resolved or not.
    pub fn beatmap_count(&self) -> usize {
        self.beatmaps.len()
    }

    /// Number of attribute keys seen, resolved or not.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }
}

async fn resolve<K, V, F, Fut>(map: &DashMap<K, Slot<V>>, key: K, fetch: F) -> Result<Option<Arc<V>>>
where
    K: Eq + Hash,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<V>>>,
{
    // Clone the slot out so no shard lock is held across the await.
    let slot = map.entry(key).or_default().clone();
    let value = slot.get_or_try_init(|| async { fetch().await.map(|found| found.map(Arc::new)) }).await?;
    Ok(value.clone())
}
