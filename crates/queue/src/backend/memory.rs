use super::QueueBackend;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

/// In-process queue.
///
/// Items are lost when the process exits. A consumer waiting in
/// [`wait_for_items`](QueueBackend::wait_for_items) is woken as soon as
/// something is pushed.
#[derive(Debug)]
pub struct MemoryQueue<T> {
    name: String,
    items: Mutex<VecDeque<T>>,
    pushed: Notify,
}

impl<T> MemoryQueue<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_items(name, [])
    }

    /// Create a queue already holding `items`, oldest first.
    pub fn with_items(name: impl Into<String>, items: impl IntoIterator<Item = T>) -> Self {
        Self {
            name: name.into(),
            items: Mutex::new(items.into_iter().collect()),
            pushed: Notify::new(),
        }
    }
}
impl<T> Default for MemoryQueue<T> {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl<T: Send + 'static> QueueBackend<T> for MemoryQueue<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn push(&self, item: T) -> Result<()> {
        self.items.lock().await.push_back(item);
        // Stores a permit if the consumer isn't waiting yet.
        self.pushed.notify_one();
        Ok(())
    }

    async fn pop(&self) -> Result<Option<T>> {
        Ok(self.items.lock().await.pop_front())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.items.lock().await.len())
    }

    async fn clear(&self) -> Result<usize> {
        let mut items = self.items.lock().await;
        let dropped = items.len();
        items.clear();
        Ok(dropped)
    }

    async fn wait_for_items(&self, timeout: Duration) {
        let _ = tokio::time::timeout(timeout, self.pushed.notified()).await;
    }
}
