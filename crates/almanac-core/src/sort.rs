//! Display ordering for the events of one day.
//!
//! All-day events come first, in the order they were given. Timed events
//! follow, ascending by the decimal-hour value of their start time
//! (`"09:30"` is 9.30, not 9.5). Both rules are stable: equal keys keep
//! their input order. The decimal reading is kept as-is because changing
//! it would reorder existing calendars.

use std::cmp::Ordering;

use crate::event::Event;

/// Sort key: `None` for all-day, `Some(HH.MM)` for timed.
pub fn display_key(event: &Event) -> Option<f64> {
    event.start_time().map(|t| t.decimal_hour())
}

pub fn compare_for_display(a: &Event, b: &Event) -> Ordering {
    match (display_key(a), display_key(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.total_cmp(&y),
    }
}

/// Stable in-place sort; works on owned events or references.
pub fn sort_events<E: AsRef<Event>>(events: &mut [E]) {
    events.sort_by(|a, b| compare_for_display(a.as_ref(), b.as_ref()));
}

pub fn sorted<E: AsRef<Event>>(mut events: Vec<E>) -> Vec<E> {
    sort_events(&mut events);
    events
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{display_key, sorted};
    use crate::event::{Event, EventColor, EventId, NewEvent};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).expect("date")
    }

    fn timed(name: &str, start: &str) -> Event {
        Event::from_parts(
            EventId::random(),
            NewEvent::timed(
                name,
                date(),
                EventColor::Blue,
                start.parse().expect("start"),
                "23:59".parse().expect("end"),
            ),
        )
    }

    fn all_day(name: &str) -> Event {
        Event::from_parts(
            EventId::random(),
            NewEvent::all_day(name, date(), EventColor::Red),
        )
    }

    fn names(events: &[&Event]) -> Vec<String> {
        events.iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn holiday_standup_call_scenario() {
        let a = all_day("Holiday");
        let b = timed("Standup", "09:00");
        let c = timed("Call", "09:30");

        let ordered = sorted(vec![&c, &b, &a]);
        assert_eq!(names(&ordered), vec!["Holiday", "Standup", "Call"]);
    }

    #[test]
    fn all_day_events_precede_timed_and_keep_input_order() {
        let events = vec![
            timed("t1", "00:00"),
            all_day("a1"),
            timed("t2", "07:15"),
            all_day("a2"),
            all_day("a3"),
        ];
        let ordered = sorted(events.iter().collect());
        assert_eq!(names(&ordered), vec!["a1", "a2", "a3", "t1", "t2"]);

        let first_timed = ordered
            .iter()
            .position(|e| !e.is_all_day())
            .expect("has timed");
        assert!(ordered[..first_timed].iter().all(|e| e.is_all_day()));
        assert!(ordered[first_timed..].iter().all(|e| !e.is_all_day()));
    }

    #[test]
    fn equal_start_times_keep_input_order() {
        let events = vec![
            timed("late", "18:00"),
            timed("first", "08:05"),
            timed("second", "08:05"),
            timed("third", "08:05"),
        ];
        let ordered = sorted(events.iter().collect());
        assert_eq!(names(&ordered), vec!["first", "second", "third", "late"]);
    }

    #[test]
    fn decimal_hour_reading_is_preserved() {
        let key = |start: &str| display_key(&timed("x", start)).expect("timed");
        assert!((key("09:40") - 9.40).abs() < 1e-9);
        assert!((key("09:30") - 9.30).abs() < 1e-9);
        assert!((key("09:30") - 9.5).abs() > 0.1);
        assert!((key("23:59") - 23.59).abs() < 1e-9);
        assert_eq!(display_key(&all_day("y")), None);
    }
}
