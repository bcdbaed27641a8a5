//! Tracking backends
//!
//! A [`TrackingBackend`] receives fully merged events from the
//! [`EventTracker`](crate::EventTracker). Transport, buffering and delivery
//! are entirely the backend's concern.

use std::sync::{Arc, Mutex, PoisonError};

use crate::types::{Event, Properties};

/// Receives events from a tracker.
///
/// There is no error channel: a backend that cannot deliver an event decides
/// for itself whether to log, drop or panic.
pub trait TrackingBackend {
    fn track(&self, event: &str, properties: &Properties);
}

impl<T: TrackingBackend + ?Sized> TrackingBackend for &T {
    fn track(&self, event: &str, properties: &Properties) {
        (**self).track(event, properties)
    }
}

impl<T: TrackingBackend + ?Sized> TrackingBackend for Box<T> {
    fn track(&self, event: &str, properties: &Properties) {
        (**self).track(event, properties)
    }
}

impl<T: TrackingBackend + ?Sized> TrackingBackend for Arc<T> {
    fn track(&self, event: &str, properties: &Properties) {
        (**self).track(event, properties)
    }
}

/// Keeps every event in memory, in call order.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    events: Mutex<Vec<Event>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recently recorded event
    pub fn last(&self) -> Option<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return everything recorded so far
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl TrackingBackend for RecordingBackend {
    fn track(&self, event: &str, properties: &Properties) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Event::new(event, properties.clone()));
    }
}

/// Writes each event to the log at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBackend;

impl TrackingBackend for LogBackend {
    fn track(&self, event: &str, properties: &Properties) {
        let payload = serde_json::to_string(properties).unwrap_or_default();
        tracing::info!(event = %event, properties = %payload, "Tracked event");
    }
}
