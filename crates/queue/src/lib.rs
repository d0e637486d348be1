//! Single-consumer queue processing.
//!
//! A [`QueueProcessor`] drains a [`QueueBackend`] one item at a time, hands
//! each item to an [`ItemHandler`] and counts the successes. Failures never
//! stop the loop; they are broadcast to subscribed error observers together
//! with the item that failed.
//!
//! Two backends are provided: [`MemoryQueue`] for in-process use and tests,
//! and [`SqliteQueue`], a durable queue living in the workspace database.

pub mod backend;
pub mod error;
mod observer;
mod processor;

pub use crate::backend::{MemoryQueue, QueueBackend, SqliteQueue};
pub use crate::observer::{ErrorObservers, ObserverHandle};
pub use crate::processor::{ItemHandler, ProcessorOptions, ProcessorState, QueueProcessor};
