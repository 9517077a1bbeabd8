//! Observability setup for the chat loop: tracing subscriber with a log file
//! sink and optional OpenTelemetry span export.

pub mod tracing_setup;
