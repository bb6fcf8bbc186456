//! Schedule record

use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

/// A single bus arrival at a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub stop_name: String,
    /// Unix timestamp in seconds
    pub arrival_time: i64,
}

impl Schedule {
    pub fn new(id: i64, stop_name: impl Into<String>, arrival_time: i64) -> Self {
        Self {
            id,
            stop_name: stop_name.into(),
            arrival_time,
        }
    }

    /// Time of day of the arrival as `HH:MM` (UTC)
    pub fn arrival_clock(&self) -> String {
        let secs = self.arrival_time.rem_euclid(SECONDS_PER_DAY);
        format!("{:02}:{:02}", secs / 3600, (secs % 3600) / 60)
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.stop_name, self.arrival_clock())
    }
}
