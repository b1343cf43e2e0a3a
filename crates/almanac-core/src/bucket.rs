use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::trace;

use crate::event::Event;

/// Groups `events` by calendar day for the supplied `days`.
///
/// Every requested day gets an entry, empty if nothing falls on it.
/// Repeated days collapse to one key, so no event lands in two buckets.
/// Events dated outside `days` are left out. Bucket contents keep the
/// order of `events`.
pub fn bucket<'a>(days: &[NaiveDate], events: &'a [Event]) -> BTreeMap<NaiveDate, Vec<&'a Event>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<&'a Event>> =
        days.iter().map(|day| (*day, Vec::new())).collect();

    let mut outside = 0usize;
    for event in events {
        match buckets.get_mut(&event.date) {
            Some(bucket) => bucket.push(event),
            None => outside += 1,
        }
    }

    trace!(
        days = buckets.len(),
        events = events.len(),
        outside,
        "bucketed events by day"
    );
    buckets
}
