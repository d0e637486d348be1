//! Score statistics processing.
//!
//! Consumes submitted scores from a durable queue and folds each into the
//! submitting user's statistics, awarding performance points only on
//! eligible beatmaps.
//!
//! # Architecture
//! - [`ScoreStatisticsHandler`]: the per-score pipeline, run by a
//!   [`QueueProcessor`](scorestats_queue::QueueProcessor).
//! - [`processors`]: the individual statistics updates.
//! - [`PerformanceCalculator`]: the performance formula seam.
//! - [`app`]: builds all of the above from a [`Config`](scorestats_config::Config).

pub mod app;
pub mod error;
mod handler;
pub mod performance;
pub mod processors;

pub use crate::handler::{PROCESSED_VERSION, ScoreStatisticsHandler};
pub use crate::performance::{NoPerformance, PerformanceCalculator};
