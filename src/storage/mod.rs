//! Storage Layer - SQLite-backed schedule dataset
//!
//! The dataset ships as a bundled asset with a single table:
//! - schedule(id, stop_name, arrival_time)
//!
//! On first use the asset is copied into the data directory and opened
//! read-only from there.

pub mod asset;
pub mod schema;
pub mod sqlite;

pub use sqlite::{ScheduleStore, write_dataset};
