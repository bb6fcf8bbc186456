//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, OpenFlags, params};
use crate::{Error, Result};
use crate::schedule::Schedule;
use super::schema;

const SELECT_COLUMNS: &str = "SELECT id, stop_name, arrival_time FROM schedule";

/// Read-only SQLite view of the schedule dataset
pub struct ScheduleStore {
    conn: Connection,
    /// Last observed `PRAGMA data_version`
    data_version: i64,
}

impl ScheduleStore {
    /// Open an existing dataset read-only and check the schema contract
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| Error::init(path, e))?;

        match schema::validate(&conn) {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => return Err(Error::init(path, reason)),
            Err(e) => return Err(Error::init(path, e)),
        }

        let mut store = Self { conn, data_version: 0 };
        store.data_version = store.read_data_version()?;
        Ok(store)
    }

    // ========== Schedule Queries ==========

    /// All schedules ordered by arrival time
    pub fn all_schedules(&self) -> Result<Vec<Schedule>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{SELECT_COLUMNS} ORDER BY arrival_time ASC, id ASC"))?;

        let schedules = stmt
            .query_map([], Self::row_to_schedule)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(schedules)
    }

    /// Schedules whose stop name equals `name` byte for byte
    pub fn schedules_by_stop_name(&self, name: &str) -> Result<Vec<Schedule>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{SELECT_COLUMNS} WHERE stop_name = ?1 ORDER BY arrival_time ASC, id ASC"
        ))?;

        let schedules = stmt
            .query_map(params![name], Self::row_to_schedule)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(schedules)
    }

    /// Distinct stop names, alphabetical
    pub fn stop_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT DISTINCT stop_name FROM schedule ORDER BY stop_name ASC")?;

        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(names)
    }

    /// Count all schedules
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM schedule", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn row_to_schedule(row: &rusqlite::Row) -> rusqlite::Result<Schedule> {
        Ok(Schedule {
            id: row.get(0)?,
            stop_name: row.get(1)?,
            arrival_time: row.get(2)?,
        })
    }

    // ========== Change Detection ==========

    fn read_data_version(&self) -> Result<i64> {
        let version = self.conn.query_row("PRAGMA data_version", [], |row| row.get(0))?;
        Ok(version)
    }

    /// Whether another connection committed to the file since the last check
    pub fn check_for_changes(&mut self) -> Result<bool> {
        let current = self.read_data_version()?;
        if current == self.data_version {
            return Ok(false);
        }
        tracing::debug!("data_version {} -> {}", self.data_version, current);
        self.data_version = current;
        Ok(true)
    }
}

/// Write a dataset file with the schedule schema and the given rows.
///
/// This is the build-time path that produces the bundled asset; the runtime
/// never writes to the dataset.
pub fn write_dataset(path: &Path, schedules: &[Schedule]) -> Result<()> {
    let mut conn = Connection::open(path)?;
    for stmt in schema::all_schema_statements() {
        conn.execute(stmt, [])?;
    }

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO schedule (id, stop_name, arrival_time) VALUES (?1, ?2, ?3)",
        )?;
        for schedule in schedules {
            stmt.execute(params![schedule.id, schedule.stop_name, schedule.arrival_time])?;
        }
    }
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows() -> Vec<Schedule> {
        vec![
            Schedule::new(1, "Main St", 8 * 3600),
            Schedule::new(2, "Main St", 8 * 3600 + 30 * 60),
            Schedule::new(3, "Elm St", 9 * 3600),
        ]
    }

    fn sample_store(dir: &tempfile::TempDir) -> ScheduleStore {
        let path = dir.path().join("bus_schedule.db");
        write_dataset(&path, &sample_rows()).unwrap();
        ScheduleStore::open_read_only(&path).unwrap()
    }

    #[test]
    fn test_all_schedules() {
        let dir = tempfile::tempdir().unwrap();
        let store = sample_store(&dir);

        let all = store.all_schedules().unwrap();
        assert_eq!(all, sample_rows());
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_by_stop_name_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let store = sample_store(&dir);

        let main = store.schedules_by_stop_name("Main St").unwrap();
        assert_eq!(main.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2]);

        assert!(store.schedules_by_stop_name("main st").unwrap().is_empty());
        assert!(store.schedules_by_stop_name("Main St ").unwrap().is_empty());
        assert!(store.schedules_by_stop_name("Oak St").unwrap().is_empty());
    }

    #[test]
    fn test_stop_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = sample_store(&dir);
        assert_eq!(store.stop_names().unwrap(), vec!["Elm St", "Main St"]);
    }

    #[test]
    fn test_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = sample_store(&dir);
        let err = store.conn.execute("DELETE FROM schedule", []);
        assert!(err.is_err());
    }

    #[test]
    fn test_detects_external_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = sample_store(&dir);
        assert!(!store.check_for_changes().unwrap());

        write_dataset(&dir.path().join("bus_schedule.db"), &[Schedule::new(4, "Oak St", 10 * 3600)]).unwrap();

        assert!(store.check_for_changes().unwrap());
        assert!(!store.check_for_changes().unwrap());
        assert_eq!(store.count().unwrap(), 4);
    }

    #[test]
    fn test_rejects_non_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.db");
        std::fs::write(&path, vec![0x42u8; 4096]).unwrap();

        let err = ScheduleStore::open_read_only(&path).err().unwrap();
        assert!(matches!(err, Error::Initialization { .. }));
    }
}
