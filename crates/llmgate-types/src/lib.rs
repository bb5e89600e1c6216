//! Shared domain types for llmgate.
//!
//! Messages, the completion configuration with its defaults, the wire-level
//! request/response shapes exchanged with a transport, and the error enums.
//!
//! No runtime or HTTP dependencies -- only serde, secrecy, thiserror.

pub mod config;
pub mod error;
pub mod llm;
