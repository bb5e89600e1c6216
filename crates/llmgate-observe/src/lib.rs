//! Observability setup for llmgate.

pub mod tracing_setup;
