//! Overflow layout: how many ordered items fit in a container before the
//! rest collapse into a "+N More" marker.
//!
//! Sizes are never estimated from item counts. A [`Measurer`] renders a
//! candidate (the first `k` items, optionally followed by the marker) and
//! reports the extent it actually consumed, so wrapping, fonts and zoom are
//! all accounted for by whoever implements it.
//!
//! The decision has two phases:
//!
//! 1. Render all `N` items without a marker. If that fits, everything is
//!    visible and no marker space is reserved.
//! 2. Otherwise binary-search the largest `k < N` for which the first `k`
//!    items plus the marker fit. Consumed size is assumed to grow with `k`.
//!    If not even the bare marker fits, `k` clamps to zero and the marker
//!    is reported as not fitting.
//!
//! A non-positive available size is treated the same way without
//! measuring any items. None of this ever fails; a cell that cannot be
//! laid out is logged and rendered empty.

use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::observer::Subscription;
use crate::viewport::Viewport;

pub trait Measurer {
    /// Extent the container can give to items and marker.
    fn available(&self) -> f64;

    /// Render the first `shown` items, followed by a marker for `marker`
    /// hidden items when `Some`, and return the consumed extent.
    fn measure(&mut self, shown: usize, marker: Option<usize>) -> f64;

    /// False while the container is mid-transition (animation, pending
    /// layout pass). Measurements taken then are not committed.
    fn is_settled(&self) -> bool {
        true
    }
}

impl<M: Measurer + ?Sized> Measurer for &mut M {
    fn available(&self) -> f64 {
        (**self).available()
    }

    fn measure(&mut self, shown: usize, marker: Option<usize>) -> f64 {
        (**self).measure(shown, marker)
    }

    fn is_settled(&self) -> bool {
        (**self).is_settled()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerState {
    /// Nothing overflowed.
    Hidden,
    Shown,
    /// Items overflowed but the marker itself has no room.
    DoesNotFit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverflowSplit {
    pub visible: usize,
    pub overflow: usize,
    pub marker: MarkerState,
}

impl OverflowSplit {
    pub fn everything(total: usize) -> Self {
        Self {
            visible: total,
            overflow: 0,
            marker: MarkerState::Hidden,
        }
    }

    fn truncated(total: usize, visible: usize, marker_fits: bool) -> Self {
        Self {
            visible,
            overflow: total - visible,
            marker: if marker_fits {
                MarkerState::Shown
            } else {
                MarkerState::DoesNotFit
            },
        }
    }

    pub fn total(&self) -> usize {
        self.visible + self.overflow
    }

    pub fn has_overflow(&self) -> bool {
        self.overflow > 0
    }
}

/// Borrowed view of a split: the visible prefix and the hidden count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOutcome<'a, T> {
    pub visible_items: &'a [T],
    pub overflow_count: usize,
    pub marker: MarkerState,
}

impl<'a, T> LayoutOutcome<'a, T> {
    fn from_split(items: &'a [T], split: OverflowSplit) -> Self {
        let visible = split.visible.min(items.len());
        Self {
            visible_items: &items[..visible],
            overflow_count: items.len() - visible,
            marker: split.marker,
        }
    }
}

fn fits(consumed: f64, available: f64) -> bool {
    consumed <= available
}

/// Decides the split for `total` items against `measurer`.
pub fn compute_split<M: Measurer + ?Sized>(total: usize, measurer: &mut M) -> OverflowSplit {
    if total == 0 {
        return OverflowSplit::everything(0);
    }

    let available = measurer.available();
    if available.is_nan() || available <= 0.0 {
        let marker_fits = fits(measurer.measure(0, Some(total)), available);
        warn!(
            available,
            total, marker_fits, "container has no room for items; showing overflow only"
        );
        return OverflowSplit::truncated(total, 0, marker_fits);
    }

    let consumed_all = measurer.measure(total, None);
    if fits(consumed_all, available) {
        trace!(total, consumed_all, available, "all items fit");
        return OverflowSplit::everything(total);
    }

    if !fits(measurer.measure(0, Some(total)), available) {
        warn!(
            available,
            total, "overflow marker does not fit; rendering nothing in this container"
        );
        return OverflowSplit::truncated(total, 0, false);
    }

    // fits(lo) holds; hi is known not to fit (hi == total was measured
    // without the marker, and adding the marker only grows it).
    let mut lo = 0usize;
    let mut hi = total;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if fits(measurer.measure(mid, Some(total - mid)), available) {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    debug!(total, visible = lo, overflow = total - lo, available, "items overflow");
    OverflowSplit::truncated(total, lo, true)
}

/// One-shot layout of `items`; see [`OverflowContainer`] for the cached,
/// re-evaluating form.
pub fn layout_items<'a, T, M>(items: &'a [T], measurer: &mut M) -> LayoutOutcome<'a, T>
where
    M: Measurer + ?Sized,
{
    let split = compute_split(items.len(), measurer);
    LayoutOutcome::from_split(items, split)
}

/// Size-aware container that remembers its last committed split and only
/// re-measures when something that affects layout has changed: the items,
/// the container size, or font/zoom.
#[derive(Debug)]
pub struct OverflowContainer<T> {
    items: Vec<T>,
    dirty: Rc<Cell<bool>>,
    committed: Option<OverflowSplit>,
    resize_observer: Option<Subscription>,
}

impl<T> OverflowContainer<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            dirty: Rc::new(Cell::new(true)),
            committed: None,
            resize_observer: None,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.dirty.set(true);
    }

    /// Marks the current split stale, e.g. after a font or zoom change
    /// that no viewport reported.
    pub fn invalidate(&mut self) {
        self.dirty.set(true);
    }

    pub fn needs_layout(&self) -> bool {
        self.dirty.get()
    }

    /// Starts observing `viewport`; any resize or rescale marks the
    /// container stale. Held until [`unmount`](Self::unmount) or drop.
    pub fn mount(&mut self, viewport: &Viewport) {
        let dirty = Rc::downgrade(&self.dirty);
        self.resize_observer = Some(viewport.observe(move |change| {
            if let Some(dirty) = dirty.upgrade() {
                trace!(?change, "container invalidated by viewport change");
                dirty.set(true);
            }
        }));
    }

    pub fn unmount(&mut self) {
        self.resize_observer = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.resize_observer.is_some()
    }

    /// Lays the items out against `measurer` if stale and returns the
    /// committed split.
    ///
    /// An unsettled measurer is not trusted: the previous split (or
    /// "everything visible" before the first commit) is returned and the
    /// container stays stale so the next settled pass measures again.
    pub fn layout<M: Measurer + ?Sized>(&mut self, measurer: &mut M) -> OverflowSplit {
        if !self.dirty.get() {
            if let Some(split) = self.committed {
                return split;
            }
        }

        if !measurer.is_settled() {
            debug!("measurer not settled; keeping previous split");
            return self
                .committed
                .unwrap_or_else(|| OverflowSplit::everything(self.items.len()));
        }

        let split = compute_split(self.items.len(), measurer);
        self.committed = Some(split);
        self.dirty.set(false);
        split
    }

    /// Last committed split, if any.
    pub fn split(&self) -> Option<OverflowSplit> {
        self.committed
    }

    pub fn outcome(&self) -> LayoutOutcome<'_, T> {
        let split = self
            .committed
            .unwrap_or_else(|| OverflowSplit::everything(self.items.len()));
        LayoutOutcome::from_split(&self.items, split)
    }
}
