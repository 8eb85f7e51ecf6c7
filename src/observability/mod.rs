//! Observability subsystem
//!
//! - Structured JSON logging, one event per line
//! - Typed lifecycle and operation events
//! - Atomic counters exposed over HTTP
//!
//! Observability is read-only: it never changes what the store does, and a
//! failed log write is ignored rather than surfaced.
//!
//! ```ignore
//! use offlinedb::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::RecordStored, &[("record_type", "nft"), ("size_bytes", "42")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
