//! Database connection and pool management.

use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Embedded migrations that are run automatically on connect.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
// One consumer, a handful of producers and the odd status query.
const MAX_CONNECTIONS: u32 = 5;

/// Database connection pool.
///
/// This is the main entry point for interacting with storage. Cloning is
/// cheap; every clone shares the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn new(options: SqliteConnectOptions, max: Option<u32>) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            // Query-based PRAGMAs only apply to the connection they ran on,
            // so they have to run for every connection the pool opens.
            .after_connect(|conn, meta| Box::pin(async move { Self::apply_pragmas(conn, meta).await }))
            .max_connections(max.unwrap_or(MAX_CONNECTIONS))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Connect to the database at the given path.
    ///
    /// Creates the database file if it doesn't exist and runs migrations.
    /// `max_connections` falls back to a small default when `None`.
    pub async fn connect(path: impl AsRef<Path>, max_connections: Option<u32>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Connecting to database");
        let options = Self::base_options().filename(path).create_if_missing(true);
        Self::new(options, max_connections).await
    }

    /// Connect to an in-memory database (useful for testing).
    ///
    /// Note:
    /// - In-memory databases are destroyed when the connection closes.
    /// - Do NOT apply `#[cfg(test)]` so that other crates can also use this in their tests.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = Self::base_options().filename(":memory:");
        // Every connection to ":memory:" opens its own, empty database.
        Self::new(options, Some(1)).await
    }

    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            // Producers push while the consumer writes results; give the
            // single WAL writer time to finish instead of failing with
            // SQLITE_BUSY.
            .busy_timeout(Duration::from_millis(5000))
    }

    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA wal_autocheckpoint = 1000;
                PRAGMA cache_size = -16384;
                PRAGMA temp_store = MEMORY;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    #[instrument("performing database migrations", skip(self))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}
