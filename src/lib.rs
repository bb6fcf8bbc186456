//! # Busschedule - bus schedules from a bundled dataset
//!
//! Busschedule provides:
//! - A process-wide database accessor that lazily materialises the bundled
//!   `bus_schedule.db` asset and opens it exactly once
//! - A schedule accessor (DAO) whose queries are observable sequences that
//!   re-emit when the underlying store changes
//! - A view model and factory that expose those queries to a consuming view

pub mod schedule;
pub mod storage;
pub mod database;
pub mod dao;
pub mod viewmodel;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use schedule::Schedule;
pub use database::{AppContext, AppDatabase, LazyHandle};
pub use dao::{ScheduleDao, ScheduleFlow};
pub use viewmodel::{BusScheduleViewModel, BusScheduleViewModelFactory, ViewModel, ViewModelFactory, ViewModelStore};

use std::path::PathBuf;

/// Result type alias for Busschedule operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Busschedule operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to initialize database at {}: {reason}", path.display())]
    Initialization { path: PathBuf, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported view model type: {0}")]
    UnsupportedViewModel(String),

    #[error("Query task failed: {0}")]
    Task(String),
}

impl Error {
    pub(crate) fn init(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Error::Initialization {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
