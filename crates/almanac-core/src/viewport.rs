//! Resize / rescale notifications for mounted overflow containers.

use std::cell::Cell;

use serde::Serialize;
use tracing::debug;

use crate::observer::{Listeners, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportChange {
    Resized(Extent),
    /// Font size or zoom changed; item sizes must be re-measured.
    Rescaled(f64),
}

#[derive(Debug)]
pub struct Viewport {
    extent: Cell<Extent>,
    scale: Cell<f64>,
    listeners: Listeners<ViewportChange>,
}

impl Viewport {
    pub fn new(extent: Extent) -> Self {
        Self {
            extent: Cell::new(extent),
            scale: Cell::new(1.0),
            listeners: Listeners::new(),
        }
    }

    pub fn extent(&self) -> Extent {
        self.extent.get()
    }

    pub fn scale(&self) -> f64 {
        self.scale.get()
    }

    pub fn observe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ViewportChange) + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn observer_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn resize(&self, extent: Extent) {
        if self.extent.get() == extent {
            return;
        }
        self.extent.set(extent);
        debug!(width = extent.width, height = extent.height, "viewport resized");
        self.listeners.notify(&ViewportChange::Resized(extent));
    }

    pub fn rescale(&self, scale: f64) {
        if self.scale.get() == scale {
            return;
        }
        self.scale.set(scale);
        debug!(scale, "viewport rescaled");
        self.listeners.notify(&ViewportChange::Rescaled(scale));
    }
}
