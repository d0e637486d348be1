//! Queue backend trait and implementations.

mod memory;
mod sqlite;

pub use self::memory::MemoryQueue;
pub use self::sqlite::SqliteQueue;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// FIFO storage for pending items.
///
/// Backends only store items; ordering guarantees beyond FIFO, capacity
/// limits and processing all belong to the [`QueueProcessor`](crate::QueueProcessor).
/// Every method takes `&self` so producers and the consumer can share one
/// backend.
#[async_trait]
pub trait QueueBackend<T: Send + 'static>: Send + Sync {
    /// Name of the queue, used for logging.
    fn name(&self) -> &str;

    async fn push(&self, item: T) -> Result<()>;

    /// Remove and return the oldest item, if any.
    ///
    /// An item that was removed but can't be decoded is returned as
    /// [`Undecodable`](crate::error::ErrorKind::Undecodable) with its raw
    /// payload.
    async fn pop(&self) -> Result<Option<T>>;

    /// Number of items not yet popped.
    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Discard every pending item, returning how many were dropped.
    async fn clear(&self) -> Result<usize>;

    /// Suspend until new items may have arrived, or at most `timeout`.
    ///
    /// Spurious wakeups are allowed. The default implementation just sleeps,
    /// which suits backends that can only be polled.
    async fn wait_for_items(&self, timeout: Duration) {
        tokio::time::sleep(timeout).await;
    }
}
