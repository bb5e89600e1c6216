use thiserror::Error;

/// Errors from constructing an admission gate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("gate capacity must be at least 1")]
    ZeroCapacity,
}

/// Errors from building or loading a completion configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid semaphore_rate: {0}")]
    InvalidCapacity(#[from] GateError),

    #[error("unknown model: '{0}'")]
    UnknownModel(String),

    #[error("temperature {0} is outside [0, 2]")]
    InvalidTemperature(f32),

    #[error("top_p {0} is outside [0, 1]")]
    InvalidTopP(f32),

    #[error("max_output_tokens must be at least 1")]
    ZeroMaxOutputTokens,

    #[error("failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),
}
