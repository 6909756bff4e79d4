//! Correlation store
//!
//! The only mutable shared state in the crate: a concurrent map from a
//! driver request id to the span opened for it. Completion handlers rely
//! on `remove` being an atomic fetch-and-delete so that two completion
//! events for the same id can never both observe the span.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use opentelemetry::global::BoxedSpan;
use std::fmt;

/// In-flight spans keyed by driver request id.
///
/// An entry exists exactly while a started event has been accepted and no
/// completion event for that id has been processed.
#[derive(Default)]
pub(crate) struct SpanRegistry {
    spans: DashMap<i32, BoxedSpan>,
}

impl SpanRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert-if-absent. On a duplicate id the map is untouched and the
    /// new span is handed back to the caller.
    pub(crate) fn insert(&self, request_id: i32, span: BoxedSpan) -> Result<(), BoxedSpan> {
        match self.spans.entry(request_id) {
            Entry::Occupied(_) => Err(span),
            Entry::Vacant(slot) => {
                slot.insert(span);
                Ok(())
            }
        }
    }

    /// Atomically remove and return the span for an id, if in flight.
    pub(crate) fn remove(&self, request_id: i32) -> Option<BoxedSpan> {
        self.spans.remove(&request_id).map(|(_, span)| span)
    }

    pub(crate) fn contains(&self, request_id: i32) -> bool {
        self.spans.contains_key(&request_id)
    }

    /// Number of operations currently in flight
    pub(crate) fn len(&self) -> usize {
        self.spans.len()
    }
}

impl fmt::Debug for SpanRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanRegistry")
            .field("in_flight", &self.spans.len())
            .finish()
    }
}
