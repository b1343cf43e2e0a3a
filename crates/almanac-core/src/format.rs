use chrono::{Datelike, NaiveDate};

use crate::event::{Event, WallTime};
use crate::grid::weekday_short;

/// Header title: `October 2026`.
pub fn month_title(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

pub fn weekday(date: NaiveDate) -> &'static str {
    weekday_short(date.weekday())
}

pub fn day_number(date: NaiveDate) -> String {
    date.day().to_string()
}

/// Numeric short date, month first: `10/19/26`.
pub fn short_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%y").to_string()
}

/// 12-hour short time without a leading zero: `9:05 AM`.
pub fn short_time(time: WallTime) -> String {
    time.to_naive_time().format("%-I:%M %p").to_string()
}

/// One-line label the way an event is drawn inside a day cell.
pub fn event_label(event: &Event) -> String {
    match event.start_time() {
        Some(start) => format!("{} {}", short_time(start), event.name),
        None => event.name.clone(),
    }
}

pub fn marker_label(template: &str, hidden: usize) -> String {
    template.replace("{n}", &hidden.to_string())
}
