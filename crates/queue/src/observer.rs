use exn::Exn;
use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

type Observer<E, T> = Arc<dyn Fn(&Exn<E>, &T) + Send + Sync>;

/// Identifies one subscription; pass it to
/// [`ErrorObservers::unsubscribe`] to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(u64);

/// Ordered list of callbacks told about every item that failed processing.
///
/// Observers run synchronously on the consumer task, in subscription order,
/// and can't influence processing. They should return quickly.
pub struct ErrorObservers<E, T>
where
    E: Error + Send + Sync + 'static,
{
    next_id: AtomicU64,
    observers: RwLock<Vec<(ObserverHandle, Observer<E, T>)>>,
}

impl<E, T> ErrorObservers<E, T>
where
    E: Error + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, observer: impl Fn(&Exn<E>, &T) + Send + Sync + 'static) -> ObserverHandle {
        let handle = ObserverHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().unwrap_or_else(PoisonError::into_inner).push((handle, Arc::new(observer)));
        handle
    }

    /// Returns `false` if `handle` was not subscribed (anymore).
    pub fn unsubscribe(&self, handle: ObserverHandle) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|(h, _)| *h != handle);
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every current observer with `error` and the failed `item`.
    pub fn notify(&self, error: &Exn<E>, item: &T) {
        // Snapshot first so observers may (un)subscribe without deadlocking.
        let observers: Vec<Observer<E, T>> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer(error, item);
        }
    }
}
impl<E, T> Default for ErrorObservers<E, T>
where
    E: Error + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
impl<E, T> Debug for ErrorObservers<E, T>
where
    E: Error + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ErrorObservers").field("len", &self.len()).finish()
    }
}
