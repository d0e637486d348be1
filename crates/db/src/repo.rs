//! Repository for every table the score statistics processor touches.
//!
//! Reference data (beatmaps, difficulty attributes, blacklist) is read-only
//! during processing; the matching write methods exist for seeding and
//! tooling. Result data (scores, user statistics, process history) is only
//! ever written through [`Repository::save_processed_score`], which keeps all
//! of it consistent within a single transaction.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{BeatmapRow, HistoryRow, ScoreRow, UserStatisticsRow};
use exn::ResultExt;
use scorestats_models::{
    Beatmap, DifficultyAttributeKey, DifficultyAttributes, MAX_WEIGHTED_PLAYS, ProcessHistory, Ruleset, Score,
    UserStatistics,
};
use sqlx::SqlitePool;
use tracing::instrument;

/// Repository for reading reference data and persisting processing results.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
    dry_run: bool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone(), dry_run: false }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    ///
    /// With `dry_run` enabled every write is skipped (and reported as
    /// successful); reads are unaffected.
    pub fn new(pool: SqlitePool, dry_run: bool) -> Self {
        Self { pool, dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    // =========================================================================
    // Beatmaps
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn get_beatmap(&self, beatmap_id: u32) -> Result<Option<Beatmap>> {
        let row: Option<BeatmapRow> = sqlx::query_as(include_str!("../queries/get_beatmap.sql"))
            .bind(i64::from(beatmap_id))
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Beatmap::try_from).transpose()
    }

    pub async fn upsert_beatmap(&self, beatmap: &Beatmap) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        let row = BeatmapRow::from(beatmap);
        sqlx::query(include_str!("../queries/upsert_beatmap.sql"))
            .bind(row.beatmap_id)
            .bind(row.beatmapset_id)
            .bind(row.playmode)
            .bind(row.approved)
            .bind(row.checksum)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    // =========================================================================
    // Difficulty attributes
    // =========================================================================

    /// Get the stored attributes matching `key` exactly.
    ///
    /// Returns an empty set when nothing is stored; it is up to the caller to
    /// decide what absence means.
    #[instrument(skip(self), fields(beatmap_id = key.beatmap_id, ruleset = %key.ruleset, mods = %key.mods))]
    pub async fn get_difficulty_attributes(&self, key: &DifficultyAttributeKey) -> Result<DifficultyAttributes> {
        let rows: Vec<(i64, f64)> = sqlx::query_as(include_str!("../queries/get_difficulty_attributes.sql"))
            .bind(i64::from(key.beatmap_id))
            .bind(i64::from(key.ruleset))
            .bind(i64::from(key.mods))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter()
            .map(|(id, value)| -> Result<(u16, f32)> {
                let id = u16::try_from(id).or_raise(|| ErrorKind::InvalidData("attribute id"))?;
                Ok((id, value as f32))
            })
            .collect()
    }

    pub async fn upsert_difficulty_attributes(
        &self,
        key: &DifficultyAttributeKey,
        attributes: &DifficultyAttributes,
    ) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for (id, value) in attributes.iter() {
            sqlx::query(include_str!("../queries/upsert_difficulty_attribute.sql"))
                .bind(i64::from(key.beatmap_id))
                .bind(i64::from(key.ruleset))
                .bind(i64::from(key.mods))
                .bind(i64::from(*id))
                .bind(f64::from(*value))
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    // =========================================================================
    // Blacklist
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn list_blacklist(&self) -> Result<Vec<(u32, Ruleset)>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(include_str!("../queries/list_blacklist.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter()
            .map(|(beatmap_id, mode)| -> Result<(u32, Ruleset)> {
                Ok((
                    u32::try_from(beatmap_id).or_raise(|| ErrorKind::InvalidData("beatmap id"))?,
                    Ruleset::try_from(mode).or_raise(|| ErrorKind::InvalidData("mode"))?,
                ))
            })
            .collect()
    }

    pub async fn blacklist(&self, beatmap_id: u32, ruleset: Ruleset) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        sqlx::query(include_str!("../queries/insert_blacklist.sql"))
            .bind(i64::from(beatmap_id))
            .bind(i64::from(ruleset))
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    // =========================================================================
    // Results
    // =========================================================================

    pub async fn get_user_statistics(&self, user_id: u32, ruleset: Ruleset) -> Result<Option<UserStatistics>> {
        let row: Option<UserStatisticsRow> = sqlx::query_as(include_str!("../queries/get_user_statistics.sql"))
            .bind(i64::from(user_id))
            .bind(i64::from(ruleset))
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(UserStatistics::try_from).transpose()
    }

    pub async fn get_score(&self, score_id: u64) -> Result<Option<Score>> {
        let score_id = i64::try_from(score_id).or_raise(|| ErrorKind::InvalidData("score id"))?;
        let row: Option<(String, Option<f64>)> = sqlx::query_as(include_str!("../queries/get_score.sql"))
            .bind(score_id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let Some((data, pp)) = row else {
            return Ok(None);
        };
        let mut score: Score = serde_json::from_str(&data).or_raise(|| ErrorKind::InvalidData("score data"))?;
        score.pp = pp;
        Ok(Some(score))
    }

    /// Get the completion marker of a score, if it was ever processed.
    pub async fn get_process_history(&self, score_id: u64) -> Result<Option<ProcessHistory>> {
        let score_id = i64::try_from(score_id).or_raise(|| ErrorKind::InvalidData("score id"))?;
        let row: Option<HistoryRow> = sqlx::query_as(include_str!("../queries/get_process_history.sql"))
            .bind(score_id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(ProcessHistory::try_from).transpose()
    }

    /// Persist everything processing a score produced, atomically.
    ///
    /// Stores the score, recomputes the user's performance and accuracy from
    /// their best plays (including this one), stores the statistics and
    /// finally writes the process history that marks the score as done.
    /// Returns the statistics as they were stored.
    #[instrument(skip_all, fields(score_id = score.id, user_id = stats.user_id, ruleset = %stats.ruleset))]
    pub async fn save_processed_score(
        &self,
        score: &Score,
        ranked: bool,
        stats: &UserStatistics,
        history: &ProcessHistory,
    ) -> Result<UserStatistics> {
        let mut stats = stats.clone();
        if self.dry_run {
            tracing::info!("Skipping result persistence during dry-run mode");
            return Ok(stats);
        }
        let score_row = ScoreRow::new(score, ranked)?;
        let history_row = HistoryRow::try_from(history)?;
        let user_id = i64::from(stats.user_id);
        let ruleset_id = i64::from(stats.ruleset);

        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/upsert_score.sql"))
            .bind(score_row.id)
            .bind(score_row.user_id)
            .bind(score_row.beatmap_id)
            .bind(score_row.ruleset_id)
            .bind(score_row.total_score)
            .bind(score_row.accuracy)
            .bind(score_row.max_combo)
            .bind(score_row.passed)
            .bind(score_row.ranked)
            .bind(score_row.pp)
            .bind(score_row.data)
            .bind(score_row.ended_at)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;

        let limit = i64::try_from(MAX_WEIGHTED_PLAYS).or_raise(|| ErrorKind::InvalidData("limit"))?;
        let best: Vec<(f64, f64)> = sqlx::query_as(include_str!("../queries/list_best_plays.sql"))
            .bind(user_id)
            .bind(ruleset_id)
            .bind(limit)
            .fetch_all(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let ranked_plays: i64 = sqlx::query_scalar(include_str!("../queries/count_ranked_plays.sql"))
            .bind(user_id)
            .bind(ruleset_id)
            .fetch_one(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        stats.apply_best_plays(&best, u64::try_from(ranked_plays).unwrap_or(0));

        let stats_row = UserStatisticsRow::try_from(&stats)?;
        sqlx::query(include_str!("../queries/upsert_user_statistics.sql"))
            .bind(stats_row.user_id)
            .bind(stats_row.ruleset_id)
            .bind(stats_row.playcount)
            .bind(stats_row.total_score)
            .bind(stats_row.ranked_score)
            .bind(stats_row.total_hits)
            .bind(stats_row.max_combo)
            .bind(stats_row.play_time)
            .bind(stats_row.pp)
            .bind(stats_row.accuracy)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;

        sqlx::query(include_str!("../queries/upsert_process_history.sql"))
            .bind(history_row.score_id)
            .bind(history_row.processed_version)
            .bind(history_row.processed_at)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(stats)
    }
}
