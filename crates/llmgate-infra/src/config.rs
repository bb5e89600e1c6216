//! Completion configuration loader.
//!
//! Reads a TOML file and deserializes it into [`CompletionConfig`]. A missing
//! file yields the defaults. A file that exists but cannot be parsed or fails
//! validation is an error.

use std::path::Path;

use llmgate_types::config::CompletionConfig;
use llmgate_types::error::ConfigError;

/// Load a completion configuration from `path`.
pub async fn load_completion_config(path: &Path) -> Result<CompletionConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            return Ok(CompletionConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                message: err.to_string(),
            });
        }
    };

    parse_completion_config(&content)
}

/// Parse and validate a TOML completion configuration.
pub fn parse_completion_config(content: &str) -> Result<CompletionConfig, ConfigError> {
    let config: CompletionConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;

    tracing::debug!(
        model = %config.model,
        semaphore_rate = config.semaphore_rate,
        has_system_prompt = config.system_prompt.is_some(),
        "loaded completion config"
    );
    Ok(config)
}
