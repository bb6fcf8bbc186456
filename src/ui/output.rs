use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::BUS, text.style(theme().title));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().ok));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().failure));
}

pub fn empty(label: &str) {
    println!("{} {}", Icons::EMPTY, label.style(theme().faint));
}

/// A stop name with its icon, e.g. for headers and stop listings
pub fn stop_label(name: &str) -> String {
    format!("{} {}", Icons::STOP, name.style(theme().stop))
}

/// Separator printed before each emission of a followed query
pub fn emission(index: usize, rows: usize) {
    println!();
    println!(
        "{} {} {}",
        Icons::CLOCK.style(theme().clock),
        format!("update #{index}").style(theme().title),
        format!("({rows} row(s))").style(theme().faint)
    );
}
