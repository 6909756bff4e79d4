//! Command event subscriber
//!
//! Correlates the driver's started / succeeded / failed events into
//! OpenTelemetry client spans. Start opens a span and parks it in the
//! [`SpanRegistry`] under the request id; whichever completion event
//! first removes the entry tags the span with its outcome and closes it.
//! Handlers are synchronous, never block, and never raise: a filtered
//! command, a missing backend, or an unmatched completion is ordinary
//! control flow, logged at debug level only.

use crate::events::{
    CommandEvent, CommandFailedEvent, CommandStartedEvent, CommandSucceededEvent, EventKind,
    ServerAddress,
};
use crate::options::InstrumentationOptions;
use crate::semconv;
use crate::store::SpanRegistry;
use opentelemetry::global::{self, BoxedSpan};
use opentelemetry::trace::{Span, SpanBuilder, SpanKind, Status};
use opentelemetry::KeyValue;
use tracing::debug;

/// Receiver of command lifecycle events.
///
/// Every method has a no-op default, so a handler only implements the
/// kinds it cares about; kinds added to [`CommandEvent`] later are
/// ignored by existing handlers rather than breaking them. [`handles`]
/// is the capability query a driver integration can use to skip
/// dispatching kinds a handler does not support.
///
/// [`handles`]: CommandEventHandler::handles
pub trait CommandEventHandler: Send + Sync {
    /// Whether this handler wants events of the given kind
    fn handles(&self, kind: EventKind) -> bool {
        let _ = kind;
        true
    }

    fn command_started(&self, event: &CommandStartedEvent) {
        let _ = event;
    }

    fn command_succeeded(&self, event: &CommandSucceededEvent) {
        let _ = event;
    }

    fn command_failed(&self, event: &CommandFailedEvent) {
        let _ = event;
    }

    /// Dispatch one event to the matching typed method.
    ///
    /// Kinds the handler does not claim via [`handles`] are silently
    /// dropped. Safe to call from concurrent driver threads.
    ///
    /// [`handles`]: CommandEventHandler::handles
    fn handle(&self, event: &CommandEvent) {
        if !self.handles(event.kind()) {
            return;
        }
        match event {
            CommandEvent::Started(e) => self.command_started(e),
            CommandEvent::Succeeded(e) => self.command_succeeded(e),
            CommandEvent::Failed(e) => self.command_failed(e),
        }
    }
}

/// Subscriber producing one client span per traced command.
///
/// Register it with the driver's command monitoring hooks and every
/// command (that passes the configured start filter) becomes a span,
/// parented from whatever context is current on the dispatching thread.
#[derive(Debug, Default)]
pub struct TracingCommandSubscriber {
    options: InstrumentationOptions,
    in_flight: SpanRegistry,
}

impl TracingCommandSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: InstrumentationOptions) -> Self {
        Self {
            options,
            in_flight: SpanRegistry::new(),
        }
    }

    /// Number of started commands still awaiting their completion event
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn start_span(&self, event: &CommandStartedEvent) -> BoxedSpan {
        let builder = SpanBuilder::from_name(event.operation_name())
            .with_kind(SpanKind::Client)
            .with_attributes(start_attributes(event));
        match &self.options.tracer {
            Some(tracer) => builder.start(tracer),
            None => builder.start(&global::tracer(crate::SCOPE_NAME)),
        }
    }
}

impl CommandEventHandler for TracingCommandSubscriber {
    fn command_started(&self, event: &CommandStartedEvent) {
        // Filter verdict comes before any tracer interaction so that
        // filtered commands cost nothing.
        if let Some(filter) = &self.options.should_start_span {
            if !filter(event) {
                debug!(
                    request_id = event.request_id,
                    command = %event.command_name,
                    "command rejected by start filter"
                );
                return;
            }
        }

        // A started event for an id that is already in flight means the
        // driver broke its uniqueness contract. Reject the duplicate and
        // keep tracking the original.
        if self.in_flight.contains(event.request_id) {
            debug!(
                request_id = event.request_id,
                "duplicate start for in-flight request id, ignoring"
            );
            return;
        }

        let mut span = self.start_span(event);
        if !span.is_recording() {
            // No backend behind the tracer: nothing will be exported and
            // nothing needs correlating.
            return;
        }

        if self.options.log_command_text || self.options.command_text_sink.is_some() {
            let text = event.command.to_string();
            if self.options.log_command_text {
                span.add_event(text.clone(), Vec::new());
            }
            if let Some(sink) = &self.options.command_text_sink {
                sink(&text);
            }
        }

        if self.in_flight.insert(event.request_id, span).is_err() {
            debug!(
                request_id = event.request_id,
                "lost start race for request id, dropping span"
            );
        }
    }

    fn command_succeeded(&self, event: &CommandSucceededEvent) {
        let Some(mut span) = self.in_flight.remove(event.request_id) else {
            debug!(
                request_id = event.request_id,
                command = %event.command_name,
                "no in-flight span for succeeded command"
            );
            return;
        };
        span.set_status(Status::Ok);
        span.end();
    }

    fn command_failed(&self, event: &CommandFailedEvent) {
        let Some(mut span) = self.in_flight.remove(event.request_id) else {
            debug!(
                request_id = event.request_id,
                command = %event.command_name,
                "no in-flight span for failed command"
            );
            return;
        };
        let failure = &event.failure;
        span.set_attribute(KeyValue::new(semconv::ERROR, true));
        span.set_attribute(KeyValue::new(semconv::ERROR_TYPE, failure.error_type.clone()));
        span.set_attribute(KeyValue::new(semconv::ERROR_MSG, failure.message.clone()));
        if let Some(stack) = &failure.stack {
            span.set_attribute(KeyValue::new(semconv::ERROR_STACK, stack.clone()));
        }
        span.set_status(Status::error(failure.message.clone()));
        span.end();
    }
}

fn start_attributes(event: &CommandStartedEvent) -> Vec<KeyValue> {
    let mut attrs = vec![
        KeyValue::new(semconv::DB_SYSTEM, semconv::DB_SYSTEM_MONGODB),
        KeyValue::new(semconv::DB_OPERATION, event.command_name.clone()),
    ];
    if let Some(db) = &event.db {
        attrs.push(KeyValue::new(semconv::DB_NAME, db.clone()));
    }
    if let Some(coll) = event.collection() {
        attrs.push(KeyValue::new(
            semconv::DB_MONGODB_COLLECTION,
            coll.to_string(),
        ));
    }
    match &event.connection {
        Some(address @ ServerAddress::Ip(addr)) => {
            attrs.push(KeyValue::new(
                semconv::DB_CONNECTION_STRING,
                format!("mongodb://{address}"),
            ));
            attrs.push(KeyValue::new(semconv::NET_PEER_IP, addr.ip().to_string()));
            attrs.push(KeyValue::new(semconv::NET_PEER_PORT, i64::from(addr.port())));
        }
        Some(address @ ServerAddress::Dns { host, port }) => {
            attrs.push(KeyValue::new(
                semconv::DB_CONNECTION_STRING,
                format!("mongodb://{address}"),
            ));
            attrs.push(KeyValue::new(semconv::NET_PEER_NAME, host.clone()));
            attrs.push(KeyValue::new(semconv::NET_PEER_PORT, i64::from(*port)));
        }
        None => {}
    }
    attrs
}
