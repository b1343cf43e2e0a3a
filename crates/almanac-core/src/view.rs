//! Month view model: grid days, their sorted events, and each cell's
//! overflow container.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Weekday};
use serde::Serialize;
use tracing::debug;

use crate::bucket::bucket;
use crate::event::Event;
use crate::format;
use crate::grid::{month_grid, same_month, weekday_labels};
use crate::layout::{MarkerState, Measurer, OverflowContainer, OverflowSplit};
use crate::sort::sort_events;
use crate::viewport::Viewport;

#[derive(Debug)]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_past: bool,
    pub is_today: bool,
    /// Weekday name, set on the first row of the grid only.
    pub weekday_header: Option<&'static str>,
    container: OverflowContainer<Event>,
}

impl DayCell {
    /// Every event of the day in display order, including hidden ones;
    /// this is what the "view more" list shows.
    pub fn events(&self) -> &[Event] {
        self.container.items()
    }

    pub fn visible_events(&self) -> &[Event] {
        self.container.outcome().visible_items
    }

    pub fn overflow_count(&self) -> usize {
        self.container.outcome().overflow_count
    }

    pub fn marker(&self) -> MarkerState {
        self.container.outcome().marker
    }

    pub fn split(&self) -> Option<OverflowSplit> {
        self.container.split()
    }

    pub fn needs_layout(&self) -> bool {
        self.container.needs_layout()
    }
}

#[derive(Debug)]
pub struct MonthView {
    reference: NaiveDate,
    today: NaiveDate,
    week_start: Weekday,
    cells: Vec<DayCell>,
}

impl MonthView {
    #[tracing::instrument(skip(events))]
    pub fn build(
        events: &[Event],
        reference: NaiveDate,
        today: NaiveDate,
        week_start: Weekday,
    ) -> Self {
        let days = month_grid(reference, week_start);
        let mut buckets = bucket(&days, events);

        let cells = days
            .iter()
            .enumerate()
            .map(|(idx, day)| {
                let mut day_events: Vec<Event> = buckets
                    .remove(day)
                    .unwrap_or_default()
                    .into_iter()
                    .cloned()
                    .collect();
                sort_events(&mut day_events);
                DayCell {
                    date: *day,
                    in_month: same_month(*day, reference),
                    is_past: *day < today,
                    is_today: *day == today,
                    weekday_header: (idx < 7).then(|| format::weekday(*day)),
                    container: OverflowContainer::new(day_events),
                }
            })
            .collect::<Vec<_>>();

        debug!(cells = cells.len(), "built month view");
        Self {
            reference,
            today,
            week_start,
            cells,
        }
    }

    pub fn title(&self) -> String {
        format::month_title(self.reference)
    }

    pub fn reference(&self) -> NaiveDate {
        self.reference
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    pub fn weekday_labels(&self) -> Vec<&'static str> {
        weekday_labels(self.week_start)
    }

    pub fn cells(&self) -> &[DayCell] {
        &self.cells
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&DayCell> {
        self.cells.iter().find(|cell| cell.date == date)
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[DayCell]> {
        self.cells.chunks(7)
    }

    /// Re-buckets and re-sorts the given days from `events`, marking their
    /// containers stale. Days outside the grid are ignored.
    pub fn refresh_days(&mut self, events: &[Event], dates: &[NaiveDate]) {
        let wanted: BTreeSet<NaiveDate> = dates.iter().copied().collect();
        let targets: Vec<NaiveDate> = self
            .cells
            .iter()
            .map(|cell| cell.date)
            .filter(|date| wanted.contains(date))
            .collect();
        let mut buckets = bucket(&targets, events);

        for cell in self.cells.iter_mut().filter(|c| wanted.contains(&c.date)) {
            let mut day_events: Vec<Event> = buckets
                .remove(&cell.date)
                .unwrap_or_default()
                .into_iter()
                .cloned()
                .collect();
            sort_events(&mut day_events);
            debug!(date = %cell.date, events = day_events.len(), "refreshed day cell");
            cell.container.set_items(day_events);
        }
    }

    /// Marks every cell stale, e.g. after the cell size changed.
    pub fn invalidate(&mut self) {
        for cell in &mut self.cells {
            cell.container.invalidate();
        }
    }

    pub fn mount(&mut self, viewport: &Viewport) {
        for cell in &mut self.cells {
            cell.container.mount(viewport);
        }
    }

    pub fn unmount(&mut self) {
        for cell in &mut self.cells {
            cell.container.unmount();
        }
    }

    /// Lays out every stale cell with the measurer `measurer_for` builds
    /// for that cell's events. Clean cells keep their committed split.
    pub fn layout<M, F>(&mut self, mut measurer_for: F)
    where
        M: Measurer,
        F: FnMut(&[Event]) -> M,
    {
        let mut measured = 0usize;
        for cell in &mut self.cells {
            if !cell.container.needs_layout() {
                continue;
            }
            let mut measurer = measurer_for(cell.container.items());
            cell.container.layout(&mut measurer);
            measured += 1;
        }
        debug!(measured, "laid out month view");
    }

    pub fn report(&self) -> MonthReport {
        MonthReport {
            title: self.title(),
            reference: self.reference,
            today: self.today,
            weekdays: self.weekday_labels(),
            cells: self
                .cells
                .iter()
                .map(|cell| CellReport {
                    date: cell.date,
                    in_month: cell.in_month,
                    is_past: cell.is_past,
                    is_today: cell.is_today,
                    weekday_header: cell.weekday_header,
                    visible: cell.visible_events().to_vec(),
                    overflow: cell.overflow_count(),
                    marker: cell.marker(),
                })
                .collect(),
        }
    }
}

/// Serializable snapshot of a laid-out month.
#[derive(Debug, Clone, Serialize)]
pub struct MonthReport {
    pub title: String,
    pub reference: NaiveDate,
    pub today: NaiveDate,
    pub weekdays: Vec<&'static str>,
    pub cells: Vec<CellReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CellReport {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_past: bool,
    pub is_today: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekday_header: Option<&'static str>,
    pub visible: Vec<Event>,
    pub overflow: usize,
    pub marker: MarkerState,
}
