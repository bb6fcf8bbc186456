//! Process-wide database accessor
//!
//! The dataset is opened lazily on first request and the handle is shared for
//! the rest of the process. Initialization uses check-lock-check: a lock-free
//! look at the published handle, then, only on a miss, the init lock followed
//! by a second look before building.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use crate::dao::ScheduleDao;
use crate::storage::{asset, ScheduleStore};
use crate::{Error, Result};

/// Location of the dataset inside the asset directory
pub const ASSET_PATH: &str = "database/bus_schedule.db";

/// File name of the materialized database inside `<data_dir>/databases`
pub const DEFAULT_DATABASE_NAME: &str = "app_database";

static INSTANCE: LazyHandle<AppDatabase> = LazyHandle::new();

/// Environment handle used to locate the bundled asset and the data directory.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub asset_dir: PathBuf,
    pub data_dir: PathBuf,
    pub database_name: String,
}

impl AppContext {
    pub fn new(asset_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            data_dir: data_dir.into(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
        }
    }

    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    pub fn asset_path(&self) -> PathBuf {
        self.asset_dir.join(ASSET_PATH)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("databases").join(&self.database_name)
    }
}

/// A lazily initialized, shared handle.
///
/// `get_or_try_init` runs the initializer at most once to success, even when
/// many threads race on the first call. A failed initializer publishes
/// nothing, so a later call may try again.
pub struct LazyHandle<T> {
    cell: OnceLock<Arc<T>>,
    init_lock: Mutex<()>,
}

impl<T> LazyHandle<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// The handle, if it has been initialized
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }

    pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> std::result::Result<T, E>) -> std::result::Result<Arc<T>, E> {
        if let Some(handle) = self.cell.get() {
            return Ok(Arc::clone(handle));
        }

        let _guard = self.init_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Another thread may have finished while we waited on the lock.
        if let Some(handle) = self.cell.get() {
            return Ok(Arc::clone(handle));
        }

        let handle = Arc::new(init()?);
        // Only writer while holding init_lock; set cannot lose a race.
        let _ = self.cell.set(Arc::clone(&handle));
        Ok(handle)
    }
}

impl<T> Default for LazyHandle<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Open handle onto the schedule dataset
pub struct AppDatabase {
    path: PathBuf,
    store: Mutex<ScheduleStore>,
    version: watch::Sender<u64>,
}

impl AppDatabase {
    /// The process-wide database, built from `ctx` on first call.
    ///
    /// Later calls return the same handle and ignore `ctx`.
    pub fn get_instance(ctx: &AppContext) -> Result<Arc<AppDatabase>> {
        INSTANCE.get_or_try_init(|| {
            tracing::info!("Opening schedule database for the first time");
            Self::build(ctx)
        })
    }

    /// The process-wide database, if it has been opened
    pub fn instance() -> Option<Arc<AppDatabase>> {
        INSTANCE.get()
    }

    /// Build a fresh handle: materialize the asset if needed and open it.
    pub fn build(ctx: &AppContext) -> Result<AppDatabase> {
        let asset = ctx.asset_path();
        let path = ctx.database_path();

        let copied = asset::materialize(&asset, &path)?;
        let store = match ScheduleStore::open_read_only(&path) {
            Ok(store) => store,
            Err(e) => {
                // Drop a fresh copy of a bad asset so it is not reused later.
                if copied {
                    std::fs::remove_file(&path).ok();
                }
                tracing::error!("Failed to open {}: {}", path.display(), e);
                return Err(e);
            }
        };

        let (version, _) = watch::channel(0);
        tracing::debug!("Opened schedule database {}", path.display());

        Ok(AppDatabase {
            path,
            store: Mutex::new(store),
            version,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accessor for the schedule queries
    pub fn schedule_dao(self: &Arc<Self>) -> ScheduleDao {
        ScheduleDao::new(Arc::clone(self))
    }

    fn lock_store(&self) -> MutexGuard<'_, ScheduleStore> {
        // Reads never leave the store half-updated, so a poisoned lock is still usable.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the store on the blocking pool
    pub(crate) async fn read<R, F>(self: &Arc<Self>, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&ScheduleStore) -> Result<R> + Send + 'static,
    {
        let db = Arc::clone(self);
        tokio::task::spawn_blocking(move || f(&*db.lock_store()))
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }

    /// Receiver that is notified each time the dataset changes
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Number of changes observed since the database was opened
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Check whether the file was modified by another connection and, if so,
    /// notify subscribers.
    pub fn check_for_changes(&self) -> Result<bool> {
        let changed = self.lock_store().check_for_changes()?;
        if changed {
            self.version.send_modify(|v| *v += 1);
            tracing::info!("Schedule dataset changed (version {})", self.version());
        }
        Ok(changed)
    }

    /// Poll for external changes every `interval` until the database is dropped.
    pub fn spawn_change_monitor(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let weak: Weak<AppDatabase> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(db) = weak.upgrade() else { break };
                match tokio::task::spawn_blocking(move || db.check_for_changes()).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => tracing::warn!("Change check failed: {}", e),
                    Err(e) => tracing::warn!("Change check task failed: {}", e),
                }
            }
            tracing::debug!("Change monitor stopped");
        })
    }
}

impl std::fmt::Debug for AppDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppDatabase")
            .field("path", &self.path)
            .field("version", &self.version())
            .finish()
    }
}
