use super::QueueBackend;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use scorestats_db::Database;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use std::marker::PhantomData;
use tracing::instrument;

/// Durable queue stored in the `queue_items` table.
///
/// Several named queues can share the table. Items are stored as JSON and
/// survive restarts; popping deletes the oldest row in the same statement
/// that reads it, so an item is handed out at most once even with several
/// processes polling the same queue.
#[derive(Debug)]
pub struct SqliteQueue<T> {
    name: String,
    pool: SqlitePool,
    _item: PhantomData<fn() -> T>,
}

impl<T> SqliteQueue<T> {
    pub fn new(db: &Database, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pool: db.pool().clone(),
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<T> QueueBackend<T> for SqliteQueue<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(level = "trace", skip_all, fields(queue = %self.name))]
    async fn push(&self, item: T) -> Result<()> {
        let payload = serde_json::to_string(&item).or_raise(|| ErrorKind::Serialization)?;
        sqlx::query(include_str!("../../queries/push.sql"))
            .bind(&self.name)
            .bind(payload)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Backend)?;
        Ok(())
    }

    #[instrument(level = "trace", skip_all, fields(queue = %self.name))]
    async fn pop(&self) -> Result<Option<T>> {
        let payload: Option<String> = sqlx::query_scalar(include_str!("../../queries/pop.sql"))
            .bind(&self.name)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Backend)?;
        // The row is already gone, so the payload travels with the error.
        payload
            .map(|p| serde_json::from_str(&p).or_raise(|| ErrorKind::Undecodable(p.clone())))
            .transpose()
    }

    async fn len(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar(include_str!("../../queries/len.sql"))
            .bind(&self.name)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Backend)?;
        usize::try_from(count).or_raise(|| ErrorKind::Backend)
    }

    async fn clear(&self) -> Result<usize> {
        let result = sqlx::query(include_str!("../../queries/clear.sql"))
            .bind(&self.name)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Backend)?;
        usize::try_from(result.rows_affected()).or_raise(|| ErrorKind::Backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Job {
        id: u32,
        label: String,
    }

    fn job(id: u32) -> Job {
        Job { id, label: format!("job {id}") }
    }

    #[tokio::test]
    async fn test_fifo_per_queue() {
        let db = Database::connect_in_memory().await.unwrap();
        let first = SqliteQueue::<Job>::new(&db, "first");
        let second = SqliteQueue::<Job>::new(&db, "second");
        first.push(job(1)).await.unwrap();
        second.push(job(100)).await.unwrap();
        first.push(job(2)).await.unwrap();

        assert_eq!(first.len().await.unwrap(), 2);
        assert_eq!(second.len().await.unwrap(), 1);
        assert_eq!(first.pop().await.unwrap(), Some(job(1)));
        assert_eq!(first.pop().await.unwrap(), Some(job(2)));
        assert_eq!(first.pop().await.unwrap(), None);
        assert_eq!(second.pop().await.unwrap(), Some(job(100)));
    }

    #[tokio::test]
    async fn test_items_survive_reconnect() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("queue.db");
        {
            let db = Database::connect(&path, None).await.unwrap();
            let queue = SqliteQueue::<Job>::new(&db, "scores");
            queue.push(job(1)).await.unwrap();
            queue.push(job(2)).await.unwrap();
            db.close().await;
        }
        let db = Database::connect(&path, None).await.unwrap();
        let queue = SqliteQueue::<Job>::new(&db, "scores");
        assert_eq!(queue.pop().await.unwrap(), Some(job(1)));
        assert_eq!(queue.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear_only_affects_own_queue() {
        let db = Database::connect_in_memory().await.unwrap();
        let first = SqliteQueue::<Job>::new(&db, "first");
        let second = SqliteQueue::<Job>::new(&db, "second");
        first.push(job(1)).await.unwrap();
        first.push(job(2)).await.unwrap();
        second.push(job(3)).await.unwrap();
        assert_eq!(first.clear().await.unwrap(), 2);
        assert!(first.is_empty().await.unwrap());
        assert_eq!(second.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_payload() {
        let db = Database::connect_in_memory().await.unwrap();
        let raw = SqliteQueue::<String>::new(&db, "scores");
        raw.push("not a job".to_string()).await.unwrap();
        let queue = SqliteQueue::<Job>::new(&db, "scores");
        let err = queue.pop().await.unwrap_err();
        assert_eq!(*err, ErrorKind::Undecodable("\"not a job\"".to_string()));
        assert!(queue.is_empty().await.unwrap());
    }
}
