//! Observability setup for memberchat: structured logging and optional
//! OpenTelemetry span export.

pub mod tracing_setup;
