//! Domain events module.
//!
//! Provides domain event types and the sink trait for emitting events
//! after successful ledger and snapshot mutations. Runtime adapters (the
//! HTTP server) implement the sink to translate events into logs or
//! follow-up work.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
