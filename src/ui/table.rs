use tabled::{settings::Style, Table, Tabled};
use crate::schedule::Schedule;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct ScheduleRow {
    #[tabled(rename = "Stop Name")]
    stop_name: String,
    #[tabled(rename = "Arrival Time")]
    arrival: String,
}

impl From<&Schedule> for ScheduleRow {
    fn from(schedule: &Schedule) -> Self {
        Self {
            stop_name: schedule.stop_name.clone(),
            arrival: schedule.arrival_clock(),
        }
    }
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

pub fn schedule_table(schedules: &[Schedule]) -> String {
    if schedules.is_empty() {
        return String::new();
    }

    let rows: Vec<ScheduleRow> = schedules.iter().map(ScheduleRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}
