pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{emission, empty, error, header, stop_label, success};
pub use table::{schedule_table, stats_table, TableBuilder};
pub use theme::{theme, Theme};
