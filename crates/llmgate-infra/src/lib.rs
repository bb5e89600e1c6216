//! Infrastructure layer for llmgate.
//!
//! Contains the implementation of the transport port defined in
//! `llmgate-core` (an OpenAI chat-completions client) and the TOML
//! configuration loader.

pub mod config;
pub mod openai;
