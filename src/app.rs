//! Wiring configuration, storage and the score queue together.

use crate::error::{ErrorKind, Result};
use crate::handler::ScoreStatisticsHandler;
use crate::performance::PerformanceCalculator;
use exn::ResultExt;
use scorestats_beatmaps::{BeatmapRecords, BeatmapStore, DifficultyCalculator, LocalContentSource};
use scorestats_config::Config;
use scorestats_db::{Database, Repository};
use scorestats_models::ScoreItem;
use scorestats_queue::{ProcessorOptions, QueueProcessor, SqliteQueue};
use std::sync::Arc;
use tracing::{info, instrument};

pub type ScoreQueue = QueueProcessor<ScoreItem, ScoreStatisticsHandler>;

/// Connect to the configured database, creating its directory if needed.
#[instrument(skip_all, fields(path = %config.database.path.display()))]
pub async fn connect(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Startup("database directory"))?;
    }
    Database::connect(&config.database.path, config.database.max_connections)
        .await
        .map_err(|err| err.raise(ErrorKind::Startup("database")))
}

/// Build the beatmap store described by `config`.
///
/// Real-time difficulty needs a `calculator`; none is built in.
pub async fn beatmap_store(
    config: &Config,
    records: Arc<dyn BeatmapRecords>,
    calculator: Option<Arc<dyn DifficultyCalculator>>,
) -> Result<BeatmapStore> {
    let store = BeatmapStore::create(records).await.map_err(|err| err.raise(ErrorKind::Startup("beatmap store")))?;
    if !config.beatmaps.realtime_difficulty {
        return Ok(store);
    }
    let (Some(content_dir), Some(calculator)) = (&config.beatmaps.content_dir, calculator) else {
        exn::bail!(ErrorKind::Startup("real-time difficulty needs a content directory and a difficulty calculator"));
    };
    info!(content_dir = %content_dir.display(), "calculating difficulty in real time");
    Ok(store.with_realtime_difficulty(Arc::new(LocalContentSource::new(content_dir)), calculator))
}

/// The durable score queue named in `config`.
pub fn score_backend(config: &Config, db: &Database) -> Arc<SqliteQueue<ScoreItem>> {
    Arc::new(SqliteQueue::new(db, config.queue.name.clone()))
}

/// Build the score queue processor on top of `db`.
pub async fn score_queue(
    config: &Config,
    db: &Database,
    performance: Arc<dyn PerformanceCalculator>,
    calculator: Option<Arc<dyn DifficultyCalculator>>,
) -> Result<ScoreQueue> {
    let repository = Repository::new(db.pool().clone(), config.processing.dry_run);
    if repository.is_dry_run() {
        info!("dry run: results will not be persisted");
    }
    let store = beatmap_store(config, Arc::new(repository.clone()), calculator).await?;
    let handler = ScoreStatisticsHandler::new(Arc::new(store), repository, performance);
    let backend = score_backend(config, db);
    let options = ProcessorOptions {
        max_in_flight: config.queue.max_in_flight,
        poll_interval: config.queue.poll_interval(),
        stop_when_empty: config.queue.stop_when_empty,
    };
    Ok(QueueProcessor::new(backend, handler, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::performance::NoPerformance;
    use crate::processors::fixtures;
    use scorestats_models::{ApprovalStatus, Ruleset};
    use scorestats_queue::QueueBackend;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn config() -> Config {
        let mut config = Config::default();
        config.queue.poll_interval_ms = 10;
        config.queue.stop_when_empty = true;
        config
    }

    #[tokio::test]
    async fn test_ranked_score_is_processed_end_to_end() {
        let db = Database::connect_in_memory().await.unwrap();
        let repository = Repository::from(&db);
        repository.upsert_beatmap(&fixtures::beatmap(1, ApprovalStatus::Ranked)).await.unwrap();

        let queue = score_queue(&config(), &db, Arc::new(NoPerformance), None).await.unwrap();
        let mut score = fixtures::score(1000, 1);
        score.ruleset = Ruleset::Osu;
        queue.push(ScoreItem::new(score)).await.unwrap();
        queue.run(CancellationToken::new()).await.unwrap();

        assert_eq!(queue.total_processed(), 1);
        assert_eq!(queue.queue_size().await.unwrap(), 0);
        let history = repository.get_process_history(1000).await.unwrap().unwrap();
        assert_eq!(history.score_id, 1000);
        assert!(repository.get_score(1000).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_score_is_reported_and_next_succeeds() {
        let db = Database::connect_in_memory().await.unwrap();
        Repository::from(&db).upsert_beatmap(&fixtures::beatmap(1, ApprovalStatus::Ranked)).await.unwrap();
        let queue = score_queue(&config(), &db, Arc::new(NoPerformance), None).await.unwrap();

        let failures = Arc::new(Mutex::new(Vec::new()));
        {
            let failures = failures.clone();
            queue.subscribe(move |err, item| failures.lock().unwrap().push(((**err).clone(), item.score.id)));
        }
        queue.push(ScoreItem::new(fixtures::score(1, 404))).await.unwrap();
        queue.push(ScoreItem::new(fixtures::score(2, 1))).await.unwrap();
        queue.run(CancellationToken::new()).await.unwrap();

        assert_eq!(queue.total_processed(), 1);
        assert_eq!(*failures.lock().unwrap(), vec![(ErrorKind::InvalidScore("unknown beatmap 404".to_string()), 1)]);
    }

    #[tokio::test]
    async fn test_dry_run_processes_without_writing() {
        let db = Database::connect_in_memory().await.unwrap();
        let repository = Repository::from(&db);
        repository.upsert_beatmap(&fixtures::beatmap(1, ApprovalStatus::Ranked)).await.unwrap();
        let mut config = config();
        config.processing.dry_run = true;

        let queue = score_queue(&config, &db, Arc::new(NoPerformance), None).await.unwrap();
        queue.push(ScoreItem::new(fixtures::score(5, 1))).await.unwrap();
        queue.run(CancellationToken::new()).await.unwrap();

        assert!(queue.wait_for_processed(1, Duration::from_millis(100)).await);
        assert!(repository.get_process_history(5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_realtime_difficulty_requires_calculator() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut config = config();
        config.beatmaps.realtime_difficulty = true;
        config.beatmaps.content_dir = Some("/srv/beatmaps".into());

        let err = score_queue(&config, &db, Arc::new(NoPerformance), None).await.err().unwrap();
        assert!(matches!(&*err, ErrorKind::Startup(_)));
    }

    #[tokio::test]
    async fn test_backend_needs_no_beatmap_setup() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut config = config();
        // Enough to make building the processor fail.
        config.beatmaps.realtime_difficulty = true;

        let backend = score_backend(&config, &db);
        backend.push(ScoreItem::new(fixtures::score(7, 1))).await.unwrap();
        assert_eq!(backend.len().await.unwrap(), 1);

        config.beatmaps.realtime_difficulty = false;
        let queue = score_queue(&config, &db, Arc::new(NoPerformance), None).await.unwrap();
        assert_eq!(queue.queue_size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_connect_creates_database_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = config();
        config.database.path = temp_dir.path().join("nested").join("scorestats.db");
        let db = connect(&config).await.unwrap();
        assert!(config.database.path.exists());
        db.close().await;
    }
}
