//! Schedule accessor
//!
//! Queries return a [`ScheduleFlow`]: the current result is emitted first and
//! the query is re-run every time the database reports a change. Dropping the
//! flow ends the subscription.

use std::sync::Arc;
use futures::stream::{BoxStream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use crate::database::AppDatabase;
use crate::schedule::Schedule;
use crate::storage::ScheduleStore;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScheduleQuery {
    All,
    ByStopName(String),
}

impl ScheduleQuery {
    fn run(&self, store: &ScheduleStore) -> Result<Vec<Schedule>> {
        match self {
            ScheduleQuery::All => store.all_schedules(),
            ScheduleQuery::ByStopName(name) => store.schedules_by_stop_name(name),
        }
    }
}

/// Read-only queries over the schedule table
#[derive(Clone)]
pub struct ScheduleDao {
    db: Arc<AppDatabase>,
}

impl ScheduleDao {
    pub fn new(db: Arc<AppDatabase>) -> Self {
        Self { db }
    }

    /// Every schedule, ordered by arrival time
    pub fn get_all(&self) -> ScheduleFlow {
        ScheduleFlow::new(Arc::clone(&self.db), ScheduleQuery::All)
    }

    /// Schedules at the stop named exactly `name`
    pub fn get_by_stop_name(&self, name: &str) -> ScheduleFlow {
        ScheduleFlow::new(Arc::clone(&self.db), ScheduleQuery::ByStopName(name.to_string()))
    }

    pub async fn count(&self) -> Result<usize> {
        self.db.read(|store| store.count()).await
    }

    pub async fn stop_names(&self) -> Result<Vec<String>> {
        self.db.read(|store| store.stop_names()).await
    }

    pub fn database(&self) -> &Arc<AppDatabase> {
        &self.db
    }
}

/// Observable query result.
///
/// Nothing is read until the flow is polled.
pub struct ScheduleFlow {
    db: Arc<AppDatabase>,
    query: ScheduleQuery,
    changes: watch::Receiver<u64>,
    started: bool,
}

impl ScheduleFlow {
    fn new(db: Arc<AppDatabase>, query: ScheduleQuery) -> Self {
        let changes = db.subscribe();
        Self {
            db,
            query,
            changes,
            started: false,
        }
    }

    /// Wait for the next emission.
    ///
    /// The first call resolves with the current result right away; later
    /// calls wait until the dataset changes. The flow holds the database open,
    /// so it never runs out of emissions; drop it to unsubscribe.
    pub async fn next(&mut self) -> Result<Vec<Schedule>> {
        if self.started {
            // The sender lives in `self.db`, so this only fails if that invariant breaks.
            self.changes
                .changed()
                .await
                .map_err(|e| Error::Task(e.to_string()))?;
        } else {
            self.started = true;
        }
        self.changes.borrow_and_update();

        let query = self.query.clone();
        self.db.read(move |store| query.run(store)).await
    }

    /// The current result, without subscribing to changes
    pub async fn first(mut self) -> Result<Vec<Schedule>> {
        self.next().await
    }

    /// Convert into a `Stream` of emissions
    pub fn into_stream(self) -> BoxStream<'static, Result<Vec<Schedule>>> {
        let ScheduleFlow { db, query, changes, .. } = self;
        WatchStream::new(changes)
            .then(move |_| {
                let db = Arc::clone(&db);
                let query = query.clone();
                async move { db.read(move |store| query.run(store)).await }
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::{fixture, sample_rows};
    use crate::storage::write_dataset;
    use std::time::Duration;

    fn open(dir: &tempfile::TempDir) -> ScheduleDao {
        let ctx = fixture(dir, &sample_rows());
        Arc::new(AppDatabase::build(&ctx).unwrap()).schedule_dao()
    }

    #[tokio::test]
    async fn test_get_all_emits_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let dao = open(&dir);

        let all = dao.get_all().first().await.unwrap();
        assert_eq!(all.len(), dao.count().await.unwrap());
        assert_eq!(all, sample_rows());
    }

    #[tokio::test]
    async fn test_get_by_stop_name() {
        let dir = tempfile::tempdir().unwrap();
        let dao = open(&dir);

        let main = dao.get_by_stop_name("Main St").first().await.unwrap();
        assert_eq!(main, sample_rows()[..2].to_vec());
        assert!(main.iter().all(|s| s.stop_name == "Main St"));

        let oak = dao.get_by_stop_name("Oak St").first().await.unwrap();
        assert!(oak.is_empty());
    }

    #[tokio::test]
    async fn test_stop_names() {
        let dir = tempfile::tempdir().unwrap();
        let dao = open(&dir);
        assert_eq!(dao.stop_names().await.unwrap(), vec!["Elm St", "Main St"]);
    }

    #[tokio::test]
    async fn test_flow_re_emits_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let dao = open(&dir);
        let mut flow = dao.get_by_stop_name("Oak St");

        assert!(flow.next().await.unwrap().is_empty());

        write_dataset(dao.database().path(), &[crate::Schedule::new(4, "Oak St", 10 * 3600)]).unwrap();
        assert!(dao.database().check_for_changes().unwrap());

        let second = tokio::time::timeout(Duration::from_secs(5), flow.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].stop_name, "Oak St");
    }

    #[tokio::test]
    async fn test_flow_waits_without_changes() {
        let dir = tempfile::tempdir().unwrap();
        let dao = open(&dir);
        let mut flow = dao.get_all();
        flow.next().await.unwrap();

        let pending = tokio::time::timeout(Duration::from_millis(50), flow.next()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_stream_emits_current_then_changes() {
        let dir = tempfile::tempdir().unwrap();
        let dao = open(&dir);
        let mut stream = dao.get_all().into_stream();

        assert_eq!(stream.next().await.unwrap().unwrap().len(), 3);

        write_dataset(dao.database().path(), &[crate::Schedule::new(4, "Oak St", 10 * 3600)]).unwrap();
        dao.database().check_for_changes().unwrap();

        let next = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(next.len(), 4);
    }

    #[tokio::test]
    async fn test_change_monitor_drives_flow() {
        let dir = tempfile::tempdir().unwrap();
        let dao = open(&dir);
        let monitor = dao.database().spawn_change_monitor(Duration::from_millis(10));
        let mut flow = dao.get_all();
        assert_eq!(flow.next().await.unwrap().len(), 3);

        write_dataset(dao.database().path(), &[crate::Schedule::new(4, "Oak St", 10 * 3600)]).unwrap();

        let next = tokio::time::timeout(Duration::from_secs(5), flow.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.len(), 4);
        monitor.abort();
    }

    #[tokio::test]
    async fn test_flow_outlives_other_handles() {
        let dir = tempfile::tempdir().unwrap();
        let dao = open(&dir);
        let path = dao.database().path().to_path_buf();
        let monitor = dao.database().spawn_change_monitor(Duration::from_millis(10));
        let mut flow = dao.get_all();
        drop(dao);

        assert_eq!(flow.next().await.unwrap().len(), 3);

        write_dataset(&path, &[crate::Schedule::new(4, "Oak St", 10 * 3600)]).unwrap();

        let next = tokio::time::timeout(Duration::from_secs(5), flow.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.len(), 4);
        assert!(!monitor.is_finished());

        // Last handle gone: the monitor winds down on its next tick.
        drop(flow);
        tokio::time::timeout(Duration::from_secs(5), monitor).await.unwrap().unwrap();
    }
}
