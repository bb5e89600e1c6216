//! Concurrency-bounded completion logic for llmgate.
//!
//! This crate defines the admission gate, the transport port that
//! infrastructure implements, and the completion facade that ties them
//! together. It depends only on `llmgate-types` -- never on `llmgate-infra`
//! or any HTTP crate.

pub mod facade;
pub mod gate;
pub mod structured;
pub mod transport;
