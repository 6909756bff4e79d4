//! Instrumentation policy
//!
//! Construction-time configuration for the subscriber, immutable once the
//! subscriber is built.

use crate::events::CommandStartedEvent;
use opentelemetry::global::BoxedTracer;
use std::fmt;

/// Predicate deciding whether a started command gets a span at all
pub type StartFilter = dyn Fn(&CommandStartedEvent) -> bool + Send + Sync;

/// Callback receiving the textual command once per accepted start event
pub type CommandTextSink = dyn Fn(&str) + Send + Sync;

/// Policy for the subscriber: which tracer to use, which commands to
/// trace, and what to do with command text.
///
/// ```
/// use opentelemetry_mongodb::InstrumentationOptions;
///
/// let options = InstrumentationOptions::new()
///     .log_command_text(true)
///     .with_start_filter(|event| event.command_name != "hello");
/// ```
#[derive(Default)]
pub struct InstrumentationOptions {
    pub(crate) tracer: Option<BoxedTracer>,
    pub(crate) should_start_span: Option<Box<StartFilter>>,
    pub(crate) command_text_sink: Option<Box<CommandTextSink>>,
    pub(crate) log_command_text: bool,
}

impl InstrumentationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this tracer instead of the process-global one
    pub fn with_tracer(mut self, tracer: BoxedTracer) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Only start spans for commands the predicate accepts.
    ///
    /// Rejected commands never touch the tracer; their completion events
    /// are no-ops.
    pub fn with_start_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&CommandStartedEvent) -> bool + Send + Sync + 'static,
    {
        self.should_start_span = Some(Box::new(filter));
        self
    }

    /// Forward the textual command to this callback on every accepted
    /// start event, independently of [`log_command_text`].
    ///
    /// This is the redaction seam: hosts that need to scrub or archive
    /// command payloads hook in here.
    ///
    /// [`log_command_text`]: Self::log_command_text
    pub fn with_command_text_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.command_text_sink = Some(Box::new(sink));
        self
    }

    /// Attach the textual command to the span as a span event
    pub fn log_command_text(mut self, enabled: bool) -> Self {
        self.log_command_text = enabled;
        self
    }
}

impl fmt::Debug for InstrumentationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentationOptions")
            .field("tracer", &self.tracer.is_some())
            .field("should_start_span", &self.should_start_span.is_some())
            .field("command_text_sink", &self.command_text_sink.is_some())
            .field("log_command_text", &self.log_command_text)
            .finish()
    }
}
