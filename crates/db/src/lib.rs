//! SQLite storage for the score statistics processor.
//!
//! The database holds two kinds of data:
//! - **Reference data** that is only ever read while processing: beatmaps,
//!   their precomputed difficulty attributes and the performance blacklist.
//!   Writes to these tables exist for seeding and tooling.
//! - **Results** written by processing: scores, per-user statistics and the
//!   process history that marks a score as done.
//!
//! The durable queue table lives in the same database, but is owned by the
//! queue crate; this crate only runs its migration.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::repo::Repository;
