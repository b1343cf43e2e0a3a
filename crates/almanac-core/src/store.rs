use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{CalendarError, CalendarResult};
use crate::event::{Event, EventId, NewEvent, SeedEvent};
use crate::observer::{Listeners, Subscription};

/// What changed in the store, with the dates whose cells need re-rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Added {
        id: EventId,
        date: NaiveDate,
    },
    Updated {
        id: EventId,
        previous_date: NaiveDate,
        date: NaiveDate,
    },
    Deleted {
        id: EventId,
        date: NaiveDate,
    },
}

impl StoreChange {
    pub fn id(&self) -> EventId {
        match self {
            StoreChange::Added { id, .. }
            | StoreChange::Updated { id, .. }
            | StoreChange::Deleted { id, .. } => *id,
        }
    }

    /// Days whose buckets are affected; an update that moves an event
    /// touches both the old and the new day.
    pub fn affected_dates(&self) -> Vec<NaiveDate> {
        match self {
            StoreChange::Added { date, .. } | StoreChange::Deleted { date, .. } => vec![*date],
            StoreChange::Updated {
                previous_date,
                date,
                ..
            } => {
                if previous_date == date {
                    vec![*date]
                } else {
                    vec![*previous_date, *date]
                }
            }
        }
    }
}

/// In-memory owner of the session's events.
///
/// `update` on an unknown id is an error (`EventNotFound`); `delete` on an
/// unknown id is a silent no-op. Listeners are called synchronously after
/// each successful mutation and never for a no-op.
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
    issued: HashSet<EventId>,
    listeners: Listeners<StoreChange>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StoreChange) + 'static,
    {
        self.listeners.subscribe(listener)
    }

    #[tracing::instrument(skip(self, event), fields(name = %event.name, date = %event.date))]
    pub fn add(&mut self, event: NewEvent) -> Event {
        let id = self.fresh_id();
        self.insert(id, event)
    }

    /// Adds an event under an id it already carries, e.g. from a seed file.
    /// Fails with `DuplicateId` if the store has ever issued that id.
    #[tracing::instrument(skip(self, event), fields(id = %id, name = %event.name))]
    pub fn restore(&mut self, id: EventId, event: NewEvent) -> CalendarResult<Event> {
        if !self.issued.insert(id) {
            return Err(CalendarError::DuplicateId(id));
        }
        Ok(self.insert(id, event))
    }

    #[tracing::instrument(skip(self, event), fields(id = %id))]
    pub fn update(&mut self, id: EventId, event: NewEvent) -> CalendarResult<()> {
        let slot = self
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(CalendarError::EventNotFound(id))?;

        let previous_date = slot.date;
        *slot = Event::from_parts(id, event);
        let date = slot.date;
        info!(%previous_date, %date, "updated event");
        self.listeners.notify(&StoreChange::Updated {
            id,
            previous_date,
            date,
        });
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn delete(&mut self, id: EventId) -> Option<Event> {
        let Some(idx) = self.events.iter().position(|e| e.id == id) else {
            debug!("delete of unknown event ignored");
            return None;
        };
        let removed = self.events.remove(idx);
        info!(date = %removed.date, "deleted event");
        self.listeners.notify(&StoreChange::Deleted {
            id,
            date: removed.date,
        });
        Some(removed)
    }

    /// Adds every seed event in order, keeping recorded ids; returns how
    /// many were added. Stops at the first duplicate id.
    pub fn extend<I>(&mut self, seed: I) -> CalendarResult<usize>
    where
        I: IntoIterator<Item = SeedEvent>,
    {
        let mut added = 0;
        for SeedEvent { id, event } in seed {
            match id {
                Some(id) => {
                    self.restore(id, event)?;
                }
                None => {
                    self.add(event);
                }
            }
            added += 1;
        }
        Ok(added)
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Snapshot of every event; the order carries no meaning.
    pub fn list(&self) -> Vec<Event> {
        self.events.clone()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn insert(&mut self, id: EventId, event: NewEvent) -> Event {
        let event = Event::from_parts(id, event);
        self.events.push(event.clone());
        info!(id = %id, "added event");
        self.listeners.notify(&StoreChange::Added {
            id,
            date: event.date,
        });
        event
    }

    fn fresh_id(&mut self) -> EventId {
        loop {
            let id = EventId::random();
            if self.issued.insert(id) {
                return id;
            }
            debug!(id = %id, "event id collision; drawing again");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use chrono::NaiveDate;

    use super::{EventStore, StoreChange};
    use crate::error::CalendarError;
    use crate::event::{EventColor, EventId, NewEvent, SeedEvent};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).expect("date")
    }

    #[test]
    fn add_then_update_keeps_id_and_replaces_fields() {
        let mut store = EventStore::new();
        let added = store.add(NewEvent::all_day("Holiday", day(5), EventColor::Red));

        let replacement = NewEvent::timed(
            "Standup",
            day(6),
            EventColor::Green,
            "09:00".parse().expect("time"),
            "10:00".parse().expect("time"),
        );
        store.update(added.id, replacement.clone()).expect("update");

        let listed = store.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, added.id);
        assert_eq!(listed[0].to_new_event(), replacement);
    }

    #[test]
    fn update_unknown_id_is_not_found_and_silent() {
        let mut store = EventStore::new();
        store.add(NewEvent::all_day("Holiday", day(5), EventColor::Red));
        let notified = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let notified = notified.clone();
            store.subscribe(move |change| notified.borrow_mut().push(change.clone()))
        };

        let ghost: EventId = "00000000-0000-4000-8000-000000000000".parse().expect("uuid");
        let before = store.list();
        let result = store.update(ghost, NewEvent::all_day("x", day(1), EventColor::Blue));

        assert_eq!(result, Err(CalendarError::EventNotFound(ghost)));
        assert_eq!(store.list(), before);
        assert!(notified.borrow().is_empty());
    }

    #[test]
    fn delete_unknown_id_leaves_store_unchanged() {
        let mut store = EventStore::new();
        store.add(NewEvent::all_day("Holiday", day(5), EventColor::Red));
        let before = store.list();

        let ghost: EventId = "00000000-0000-4000-8000-000000000001".parse().expect("uuid");
        assert!(store.delete(ghost).is_none());
        assert_eq!(store.list(), before);
    }

    #[test]
    fn ids_are_never_reused_after_delete() {
        let mut store = EventStore::new();
        let first = store.add(NewEvent::all_day("a", day(1), EventColor::Red));
        store.delete(first.id).expect("deleted");
        for _ in 0..64 {
            let next = store.add(NewEvent::all_day("b", day(1), EventColor::Red));
            assert_ne!(next.id, first.id);
        }
        assert_eq!(store.len(), 64);
    }

    #[test]
    fn mutations_notify_subscribers_with_affected_dates() {
        let mut store = EventStore::new();
        let notified = Rc::new(RefCell::new(Vec::new()));
        let sub = {
            let notified = notified.clone();
            store.subscribe(move |change: &StoreChange| {
                notified.borrow_mut().push(change.affected_dates())
            })
        };

        let event = store.add(NewEvent::all_day("Trip", day(3), EventColor::Blue));
        store
            .update(event.id, NewEvent::all_day("Trip", day(4), EventColor::Blue))
            .expect("update");
        store.delete(event.id);

        assert_eq!(
            *notified.borrow(),
            vec![vec![day(3)], vec![day(3), day(4)], vec![day(4)]]
        );

        drop(sub);
        store.add(NewEvent::all_day("Later", day(9), EventColor::Red));
        assert_eq!(notified.borrow().len(), 3);
    }

    #[test]
    fn seed_keeps_recorded_ids_and_rejects_duplicates() {
        let mut store = EventStore::new();
        let kept: EventId = "7d0f2c1e-5b7a-4c1e-9a63-2f1c0d9e8b11".parse().expect("uuid");
        let added = store
            .extend(vec![
                SeedEvent {
                    id: Some(kept),
                    event: NewEvent::all_day("Holiday", day(5), EventColor::Red),
                },
                SeedEvent::from(NewEvent::all_day("Fresh", day(6), EventColor::Green)),
            ])
            .expect("seed");
        assert_eq!(added, 2);
        assert_eq!(store.get(kept).map(|e| e.name.as_str()), Some("Holiday"));

        let again = store.restore(kept, NewEvent::all_day("Clash", day(7), EventColor::Blue));
        assert_eq!(again, Err(CalendarError::DuplicateId(kept)));
        assert_eq!(store.len(), 2);

        store.delete(kept).expect("deleted");
        let reused = store.restore(kept, NewEvent::all_day("Back", day(7), EventColor::Blue));
        assert_eq!(reused, Err(CalendarError::DuplicateId(kept)));
    }
}
