//! Synchronous single-threaded listener registry with scoped subscriptions.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

type Listener<E> = Rc<dyn Fn(&E)>;

struct Registry<E> {
    next_id: u64,
    listeners: BTreeMap<u64, Listener<E>>,
}

pub struct Listeners<E> {
    registry: Rc<RefCell<Registry<E>>>,
}

impl<E: 'static> Listeners<E> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                listeners: BTreeMap::new(),
            })),
        }
    }

    /// Registers `listener` until the returned handle is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + 'static,
    {
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.insert(id, Rc::new(listener));
            id
        };
        trace!(listener = id, "listener subscribed");

        let weak: Weak<RefCell<Registry<E>>> = Rc::downgrade(&self.registry);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    registry.borrow_mut().listeners.remove(&id);
                    trace!(listener = id, "listener released");
                }
            })),
        }
    }

    /// Calls every listener registered when the notification starts.
    ///
    /// Listeners run against a snapshot, so they may subscribe or drop
    /// subscriptions (their own included) while being notified.
    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Listener<E>> =
            self.registry.borrow().listeners.values().cloned().collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.registry.borrow().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: 'static> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.registry.borrow().listeners.len())
            .finish()
    }
}

/// Scoped registration; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::{Listeners, Subscription};

    #[test]
    fn dropping_subscription_stops_notifications() {
        let listeners: Listeners<u32> = Listeners::new();
        let seen = Rc::new(Cell::new(0));

        let sub = {
            let seen = seen.clone();
            listeners.subscribe(move |value| seen.set(seen.get() + value))
        };
        listeners.notify(&2);
        assert_eq!(seen.get(), 2);
        assert_eq!(listeners.len(), 1);

        drop(sub);
        listeners.notify(&5);
        assert_eq!(seen.get(), 2);
        assert!(listeners.is_empty());
    }

    #[test]
    fn listener_may_unsubscribe_itself_during_notify() {
        let listeners: Listeners<()> = Listeners::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));

        let sub = {
            let slot = slot.clone();
            let calls = calls.clone();
            listeners.subscribe(move |_| {
                calls.set(calls.get() + 1);
                slot.borrow_mut().take();
            })
        };
        *slot.borrow_mut() = Some(sub);

        listeners.notify(&());
        listeners.notify(&());
        assert_eq!(calls.get(), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn subscription_outliving_registry_is_harmless() {
        let listeners: Listeners<u8> = Listeners::new();
        let sub = listeners.subscribe(|_| {});
        drop(listeners);
        sub.unsubscribe();
    }
}
