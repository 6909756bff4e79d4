//! OpenTelemetry instrumentation for MongoDB command monitoring
//!
//! Turns a MongoDB driver's command lifecycle events into OpenTelemetry
//! client spans:
//!
//! - **Events**: the started / succeeded / failed payloads a driver
//!   hands to its monitoring hooks
//! - **Subscriber**: correlates each started event with its completion
//!   and opens, tags, and closes exactly one span per traced command
//! - **Options**: tracer override, start filtering, and command-text
//!   handling policy
//!
//! ```
//! use opentelemetry_mongodb::{InstrumentationOptions, TracingCommandSubscriber};
//!
//! let subscriber = TracingCommandSubscriber::with_options(
//!     InstrumentationOptions::new().with_start_filter(|event| event.command_name != "hello"),
//! );
//! // hand `subscriber` to the driver's command monitoring registration;
//! // it dispatches via `CommandEventHandler::handle`.
//! ```
//!
//! Spans parent from whatever `opentelemetry::Context` is current on the
//! thread the driver dispatches from; this crate never threads parent
//! ids by hand. Instrumentation never fails the command it observes: a
//! filtered command, an absent backend, or an unmatched completion event
//! is a silent no-op.

pub mod events;
pub mod options;
pub mod semconv;
mod store;
pub mod subscriber;

pub use events::{
    AddressParseError, CommandEvent, CommandFailedEvent, CommandFailure, CommandStartedEvent,
    CommandSucceededEvent, EventKind, ServerAddress,
};
pub use options::{CommandTextSink, InstrumentationOptions, StartFilter};
pub use subscriber::{CommandEventHandler, TracingCommandSubscriber};

/// Instrumentation scope name under which spans are produced when no
/// tracer override is configured
pub const SCOPE_NAME: &str = "opentelemetry-mongodb";
