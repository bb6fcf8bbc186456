//! Dataset schema contract
//!
//! The bundled asset is built ahead of time; at runtime the schema is only
//! checked, never created or migrated.

use rusqlite::Connection;

/// Table holding the schedule rows
pub const SCHEDULE_TABLE: &str = "schedule";

/// A column the accessor reads
#[derive(Debug, Clone, Copy)]
pub struct ColumnContract {
    pub name: &'static str,
    /// Declared SQLite type
    pub ty: &'static str,
    pub not_null: bool,
    pub primary_key: bool,
}

pub const REQUIRED_COLUMNS: &[ColumnContract] = &[
    ColumnContract { name: "id", ty: "INTEGER", not_null: false, primary_key: true },
    ColumnContract { name: "stop_name", ty: "TEXT", not_null: true, primary_key: false },
    ColumnContract { name: "arrival_time", ty: "INTEGER", not_null: true, primary_key: false },
];

/// Rows whose stored values would not map onto a `Schedule`
const COUNT_INVALID_ROWS: &str = "SELECT COUNT(*) FROM schedule \
     WHERE typeof(stop_name) <> 'text' OR typeof(arrival_time) <> 'integer'";

/// SQL to create the schedule table (used when building a dataset asset)
pub const CREATE_SCHEDULE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schedule (
    id INTEGER PRIMARY KEY NOT NULL,
    stop_name TEXT NOT NULL,
    arrival_time INTEGER NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_schedule_stop_name ON schedule(stop_name)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_SCHEDULE_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}

struct DeclaredColumn {
    name: String,
    ty: String,
    not_null: bool,
    primary_key: bool,
}

/// Check that the connected database satisfies the schedule contract.
///
/// Both the declared columns and the stored rows are checked, so a dataset
/// that opens here can be read in full. Returns a human-readable reason on
/// violation. SQLite errors (e.g. the file is not a database) are returned
/// as-is.
pub fn validate(conn: &Connection) -> rusqlite::Result<Result<(), String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({SCHEDULE_TABLE})"))?;
    let columns: Vec<DeclaredColumn> = stmt
        .query_map([], |row| {
            Ok(DeclaredColumn {
                name: row.get(1)?,
                ty: row.get(2)?,
                not_null: row.get::<_, i64>(3)? != 0,
                primary_key: row.get::<_, i64>(5)? != 0,
            })
        })?
        .collect::<rusqlite::Result<_>>()?;

    if columns.is_empty() {
        return Ok(Err(format!("missing table '{SCHEDULE_TABLE}'")));
    }

    for contract in REQUIRED_COLUMNS {
        let name = contract.name;
        let Some(declared) = columns.iter().find(|c| c.name == name) else {
            return Ok(Err(format!("missing column '{SCHEDULE_TABLE}.{name}'")));
        };
        if !declared.ty.eq_ignore_ascii_case(contract.ty) {
            return Ok(Err(format!(
                "column '{SCHEDULE_TABLE}.{name}' has type {}, expected {}",
                declared.ty, contract.ty
            )));
        }
        if contract.not_null && !declared.not_null {
            return Ok(Err(format!("column '{SCHEDULE_TABLE}.{name}' must be NOT NULL")));
        }
        if contract.primary_key && !declared.primary_key {
            return Ok(Err(format!("column '{SCHEDULE_TABLE}.{name}' must be the PRIMARY KEY")));
        }
    }

    // Type affinity lets a TEXT value into an INTEGER column; catch it here
    // rather than on the first query.
    let invalid: i64 = conn.query_row(COUNT_INVALID_ROWS, [], |row| row.get(0))?;
    if invalid > 0 {
        return Ok(Err(format!("{invalid} row(s) in '{SCHEDULE_TABLE}' hold values of the wrong type")));
    }

    Ok(Ok(()))
}
