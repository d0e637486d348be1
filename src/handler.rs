use crate::error::{Error, ErrorKind, Result};
use crate::performance::PerformanceCalculator;
use crate::processors::{ScoreContext, StatisticsProcessor, default_processors};
use async_trait::async_trait;
use exn::OptionExt;
use scorestats_beatmaps::BeatmapStore;
use scorestats_beatmaps::error::{Error as BeatmapError, ErrorKind as BeatmapErrorKind};
use scorestats_db::Repository;
use scorestats_models::{ProcessHistory, ScoreItem, UserStatistics};
use scorestats_queue::ItemHandler;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, trace};

/// Version stamped into the process history of every score handled here.
///
/// Scores whose history carries this version or newer are skipped; bump it
/// to make a reprocess pick up scores again.
pub const PROCESSED_VERSION: u8 = 1;

fn beatmap_failure(err: BeatmapError) -> Error {
    let kind = match &*err {
        BeatmapErrorKind::TransientFetchFailure | BeatmapErrorKind::BlacklistUnavailable => {
            ErrorKind::TransientFetchFailure
        },
        BeatmapErrorKind::ContentUnavailable(beatmap_id) => ErrorKind::ContentUnavailable(*beatmap_id),
        BeatmapErrorKind::Calculation | BeatmapErrorKind::InvalidData => ErrorKind::Difficulty,
    };
    err.raise(kind)
}

fn read_failure(err: scorestats_db::error::Error) -> Error {
    let kind = if err.is_retryable() { ErrorKind::TransientFetchFailure } else { ErrorKind::Persistence };
    err.raise(kind)
}

/// Turns one queued score into updated user statistics.
///
/// For every score: skip it if it was already processed, validate it,
/// resolve its beatmap, award performance when the score passed on an
/// eligible beatmap with known difficulty, fold it into the user's
/// statistics and persist everything together with the completion marker.
pub struct ScoreStatisticsHandler {
    store: Arc<BeatmapStore>,
    repository: Repository,
    performance: Arc<dyn PerformanceCalculator>,
    processors: Vec<Box<dyn StatisticsProcessor>>,
}

impl ScoreStatisticsHandler {
    pub fn new(store: Arc<BeatmapStore>, repository: Repository, performance: Arc<dyn PerformanceCalculator>) -> Self {
        Self {
            store,
            repository,
            performance,
            processors: default_processors(),
        }
    }

    /// Replace the statistics processors.
    pub fn with_processors(mut self, processors: Vec<Box<dyn StatisticsProcessor>>) -> Self {
        self.processors = processors;
        self
    }

    pub fn store(&self) -> &Arc<BeatmapStore> {
        &self.store
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Whether storage already holds a current completion marker for the
    /// item, even though the queued copy doesn't know about it.
    async fn stored_history(&self, item: &ScoreItem) -> Result<Option<ProcessHistory>> {
        let history = self.repository.get_process_history(item.score.id).await.map_err(read_failure)?;
        Ok(history.filter(|h| h.processed_version >= PROCESSED_VERSION))
    }
}

#[async_trait]
impl ItemHandler<ScoreItem> for ScoreStatisticsHandler {
    type ErrorKind = ErrorKind;

    #[instrument(skip_all, fields(score_id = item.score.id, user_id = item.score.user_id))]
    async fn handle(&self, item: &mut ScoreItem) -> Result<()> {
        if item.is_processed(PROCESSED_VERSION) {
            debug!("score already processed");
            return Ok(());
        }
        if let Some(history) = self.stored_history(item).await? {
            debug!(version = history.processed_version, "score already processed according to storage");
            item.history = Some(history);
            return Ok(());
        }

        let score = &mut item.score;
        score.validate().map_err(|err| {
            let reason = (*err).to_string();
            err.raise(ErrorKind::InvalidScore(reason))
        })?;

        let beatmap = self
            .store
            .get_beatmap(score.beatmap_id)
            .await
            .map_err(beatmap_failure)?
            .ok_or_raise(|| ErrorKind::InvalidScore(format!("unknown beatmap {}", score.beatmap_id)))?;

        let ranked = score.passed && self.store.is_valid_for_performance(&beatmap, score.ruleset);
        score.pp = None;
        if ranked {
            let attributes = self
                .store
                .get_difficulty_attributes(&beatmap, score.ruleset, &score.mods)
                .await
                .map_err(beatmap_failure)?;
            match attributes {
                Some(attributes) => score.pp = self.performance.calculate(score, &attributes),
                None => debug!(beatmap_id = beatmap.id, "no difficulty attributes, performance not awarded"),
            }
        }

        let mut stats = self
            .repository
            .get_user_statistics(score.user_id, score.ruleset)
            .await
            .map_err(read_failure)?
            .unwrap_or_else(|| UserStatistics::new(score.user_id, score.ruleset));
        let context = ScoreContext {
            score: &*score,
            beatmap: &beatmap,
            ranked,
        };
        for processor in &self.processors {
            trace!(processor = processor.name(), "applying statistics processor");
            processor.apply(&context, &mut stats);
        }

        let history = ProcessHistory {
            score_id: score.id,
            processed_version: PROCESSED_VERSION,
            processed_at: OffsetDateTime::now_utc(),
        };
        let stats = self
            .repository
            .save_processed_score(score, ranked, &stats, &history)
            .await
            .map_err(|err| err.raise(ErrorKind::Persistence))?;
        info!(ranked, pp = ?score.pp, user_pp = stats.pp, "processed score");
        item.history = Some(history);
        Ok(())
    }
}
