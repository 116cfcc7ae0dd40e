//! Domain events runtime bridge for the web server.
//!
//! Receives domain events via `DomainEventSink` and hands them to a
//! background worker that writes them to the structured log.

mod sink;

pub use sink::WebDomainEventSink;
