use crate::backend::QueueBackend;
use crate::error::{ErrorKind, Result};
use crate::observer::{ErrorObservers, ObserverHandle};
use async_trait::async_trait;
use exn::Exn;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Processes one dequeued item.
#[async_trait]
pub trait ItemHandler<T: Send + 'static>: Send + Sync {
    /// Error kind reported to observers when an item fails.
    type ErrorKind: std::error::Error + Send + Sync + 'static;

    /// Process `item`. The handler may update the item (for example to
    /// record its outcome) before observers see it.
    async fn handle(&self, item: &mut T) -> std::result::Result<(), Exn<Self::ErrorKind>>;
}

#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    /// Upper bound on items in flight plus queued; `push` is rejected once
    /// reached. `Some(1)` gives single-file mode. `None` is unbounded.
    pub max_in_flight: Option<usize>,
    /// Longest the consumer sleeps before checking an empty queue again.
    /// Also bounds how long cancellation takes to be noticed by a backend
    /// that can't wake the consumer.
    pub poll_interval: Duration,
    /// Stop once the queue is found empty instead of waiting for more.
    pub stop_when_empty: bool,
}
impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            max_in_flight: None,
            poll_interval: Duration::from_millis(500),
            stop_when_empty: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProcessorState {
    /// Never run.
    Idle = 0,
    /// Consumer loop running.
    Draining = 1,
    /// Consumer loop returned; it may be started again.
    Stopped = 2,
}
impl ProcessorState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

/// Strictly serialized consumer of a [`QueueBackend`].
///
/// Items are processed one at a time in FIFO order by a single call to
/// [`run`](Self::run). Successes increment a counter readable without
/// locking; failures are handed to every subscribed error observer and the
/// loop carries on with the next item. Items the backend could not decode
/// never reach the handler and go to the undecodable-item observers instead.
///
/// Share the processor behind an [`Arc`] to push from other tasks while
/// `run` is draining.
pub struct QueueProcessor<T, H>
where
    T: Send + 'static,
    H: ItemHandler<T>,
{
    backend: Arc<dyn QueueBackend<T>>,
    handler: H,
    options: ProcessorOptions,
    processed: AtomicU64,
    in_flight: AtomicBool,
    // Held across the limit check and push, and across pop and `in_flight`.
    admission: Mutex<()>,
    state: AtomicU8,
    observers: ErrorObservers<H::ErrorKind, T>,
    undecodable: ErrorObservers<ErrorKind, String>,
}

impl<T, H> QueueProcessor<T, H>
where
    T: Send + 'static,
    H: ItemHandler<T>,
{
    pub fn new(backend: Arc<dyn QueueBackend<T>>, handler: H, options: ProcessorOptions) -> Self {
        Self {
            backend,
            handler,
            options,
            processed: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
            admission: Mutex::new(()),
            state: AtomicU8::new(ProcessorState::Idle as u8),
            observers: ErrorObservers::new(),
            undecodable: ErrorObservers::new(),
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    /// Enqueue `item`.
    ///
    /// With [`max_in_flight`](ProcessorOptions::max_in_flight) set, fails
    /// with [`InvalidState`](ErrorKind::InvalidState) once the item being
    /// processed plus the backlog reach the limit. A push racing the
    /// consumer's dequeue waits for it rather than seeing a half-moved item.
    pub async fn push(&self, item: T) -> Result<()> {
        let Some(max) = self.options.max_in_flight else {
            return self.backend.push(item).await;
        };
        let _admission = self.admission.lock().await;
        let pending = usize::from(self.in_flight.load(Ordering::Acquire)) + self.backend.len().await?;
        if pending >= max {
            exn::bail!(ErrorKind::InvalidState("queue is full"));
        }
        self.backend.push(item).await
    }

    /// Number of items waiting to be dequeued.
    pub async fn queue_size(&self) -> Result<usize> {
        self.backend.len().await
    }

    /// Drop the backlog. The item currently being processed, if any, is not
    /// affected.
    pub async fn clear_queue(&self) -> Result<usize> {
        let dropped = self.backend.clear().await?;
        info!(queue = self.backend.name(), dropped, "cleared queue");
        Ok(dropped)
    }

    /// Number of items processed successfully since creation.
    pub fn total_processed(&self) -> u64 {
        self.processed.load(Ordering::Acquire)
    }

    pub fn state(&self) -> ProcessorState {
        ProcessorState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn subscribe(
        &self,
        observer: impl Fn(&Exn<H::ErrorKind>, &T) + Send + Sync + 'static,
    ) -> ObserverHandle {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&self, handle: ObserverHandle) -> bool {
        self.observers.unsubscribe(handle)
    }

    /// Subscribe to items dropped because the backend could not decode them.
    /// The observer gets the raw payload.
    pub fn subscribe_undecodable(
        &self,
        observer: impl Fn(&Exn<ErrorKind>, &String) + Send + Sync + 'static,
    ) -> ObserverHandle {
        self.undecodable.subscribe(observer)
    }

    pub fn unsubscribe_undecodable(&self, handle: ObserverHandle) -> bool {
        self.undecodable.unsubscribe(handle)
    }

    /// Wait until at least `count` items have been processed successfully.
    ///
    /// Returns `false` if that didn't happen within `timeout`.
    pub async fn wait_for_processed(&self, count: u64, timeout: Duration) -> bool {
        let poll = Duration::from_millis(10).min(timeout);
        let wait = async {
            while self.total_processed() < count {
                tokio::time::sleep(poll).await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }

    /// Consume the queue until `cancellation` fires (or, with
    /// [`stop_when_empty`](ProcessorOptions::stop_when_empty), until the
    /// queue is empty).
    ///
    /// Cancellation is checked between items: an item that has been
    /// dequeued is always processed to completion. Fails with
    /// [`InvalidState`](ErrorKind::InvalidState) if the loop is already
    /// running.
    #[instrument(skip_all, fields(queue = self.backend.name()))]
    pub async fn run(&self, cancellation: CancellationToken) -> Result<()> {
        let started = [ProcessorState::Idle, ProcessorState::Stopped].into_iter().any(|from| {
            self.state
                .compare_exchange(from as u8, ProcessorState::Draining as u8, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        });
        if !started {
            exn::bail!(ErrorKind::InvalidState("processor is already running"));
        }
        info!("queue processor started");

        loop {
            if cancellation.is_cancelled() {
                info!("cancellation requested");
                break;
            }
            match self.dequeue().await {
                Ok(Some(item)) => self.process(item).await,
                Ok(None) if self.options.stop_when_empty => {
                    info!("queue is empty");
                    break;
                },
                Ok(None) => {
                    tokio::select! {
                        _ = cancellation.cancelled() => {},
                        _ = self.backend.wait_for_items(self.options.poll_interval) => {},
                    }
                },
                Err(err) => match &*err {
                    ErrorKind::Undecodable(payload) => {
                        warn!(error = ?err, "dropping undecodable item");
                        self.undecodable.notify(&err, payload);
                    },
                    _ => {
                        warn!(error = ?err, "failed to dequeue, retrying after poll interval");
                        tokio::select! {
                            _ = cancellation.cancelled() => {},
                            _ = tokio::time::sleep(self.options.poll_interval) => {},
                        }
                    },
                },
            }
        }

        self.in_flight.store(false, Ordering::Release);
        self.state.store(ProcessorState::Stopped as u8, Ordering::Release);
        info!(processed = self.total_processed(), "queue processor stopped");
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<T>> {
        let _admission = self.admission.lock().await;
        let popped = self.backend.pop().await;
        if let Ok(Some(_)) = &popped {
            self.in_flight.store(true, Ordering::Release);
        }
        popped
    }

    async fn process(&self, mut item: T) {
        let result = self.handler.handle(&mut item).await;
        self.in_flight.store(false, Ordering::Release);
        match result {
            Ok(()) => {
                let total = self.processed.fetch_add(1, Ordering::AcqRel) + 1;
                debug!(total, "processed item");
            },
            Err(err) => {
                warn!(error = ?err, "failed to process item");
                self.observers.notify(&err, &item);
            },
        }
    }
}
