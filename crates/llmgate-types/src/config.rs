//! Completion configuration types for llmgate.
//!
//! `CompletionConfig` holds everything a facade needs to shape outbound
//! requests: model, sampling parameters, output cap, the gate capacity and an
//! optional system prompt and credential. All fields have defaults, so an
//! empty TOML document is a valid configuration.

use std::fmt;
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ConfigError, GateError};

/// Models the facade may target.
///
/// Deserializes through [`FromStr`], so an unknown name reports
/// [`ConfigError::UnknownModel`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum CompletionModel {
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[default]
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
}

impl CompletionModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionModel::Gpt4o => "gpt-4o",
            CompletionModel::Gpt4oMini => "gpt-4o-mini",
        }
    }
}

impl fmt::Display for CompletionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompletionModel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gpt-4o" => Ok(CompletionModel::Gpt4o),
            "gpt-4o-mini" => Ok(CompletionModel::Gpt4oMini),
            other => Err(ConfigError::UnknownModel(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for CompletionModel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Options for a completion facade.
///
/// Loaded from TOML or built in code via `Default` plus struct update syntax.
/// `api_key` is never serialized and is redacted in `Debug` output.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default)]
    pub model: CompletionModel,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Maximum number of requests in flight at once.
    #[serde(default = "default_semaphore_rate")]
    pub semaphore_rate: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// When absent the transport resolves a credential from its environment.
    #[serde(default, skip_serializing, deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,

    /// Override for OpenAI-compatible endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

fn default_temperature() -> f32 {
    0.01
}

fn default_top_p() -> f32 {
    1.0
}

fn default_max_output_tokens() -> u32 {
    2048
}

fn default_semaphore_rate() -> usize {
    10
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: CompletionModel::default(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
            semaphore_rate: default_semaphore_rate(),
            system_prompt: None,
            api_key: None,
            api_base: None,
        }
    }
}

impl CompletionConfig {
    /// Check value ranges, including a non-zero gate capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.semaphore_rate == 0 {
            return Err(GateError::ZeroCapacity.into());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(ConfigError::InvalidTopP(self.top_p));
        }
        if self.max_output_tokens == 0 {
            return Err(ConfigError::ZeroMaxOutputTokens);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_completion_config_default_values() {
        let config = CompletionConfig::default();
        assert_eq!(config.model, CompletionModel::Gpt4oMini);
        assert_eq!(config.temperature, 0.01);
        assert_eq!(config.top_p, 1.0);
        assert_eq!(config.max_output_tokens, 2048);
        assert_eq!(config.semaphore_rate, 10);
        assert!(config.system_prompt.is_none());
        assert!(config.api_key.is_none());
        assert!(config.api_base.is_none());
    }

    #[test]
    fn test_completion_config_deserialize_empty() {
        let config: CompletionConfig = toml::from_str("").unwrap();
        assert_eq!(config.model, CompletionModel::Gpt4oMini);
        assert_eq!(config.semaphore_rate, 10);
        assert_eq!(config.max_output_tokens, 2048);
    }

    #[test]
    fn test_completion_config_deserialize_with_values() {
        let toml_str = r#"
model = "gpt-4o"
temperature = 0.7
semaphore_rate = 3
system_prompt = "be terse"
api_key = "sk-test"
"#;
        let config: CompletionConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model, CompletionModel::Gpt4o);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.top_p, 1.0);
        assert_eq!(config.semaphore_rate, 3);
        assert_eq!(config.system_prompt.as_deref(), Some("be terse"));
        assert_eq!(
            config.api_key.as_ref().map(|k| k.expose_secret()),
            Some("sk-test")
        );
    }

    #[test]
    fn test_completion_config_rejects_unknown_model() {
        let err = toml::from_str::<CompletionConfig>(r#"model = "gpt-3""#).unwrap_err();
        assert!(err.to_string().contains("unknown model: 'gpt-3'"), "{err}");
    }

    #[test]
    fn test_model_serde_uses_wire_names() {
        let json = serde_json::to_value(CompletionModel::Gpt4o).unwrap();
        assert_eq!(json, "gpt-4o");
        let model: CompletionModel = serde_json::from_value(json).unwrap();
        assert_eq!(model, CompletionModel::Gpt4o);
    }

    #[test]
    fn test_api_key_is_not_leaked() {
        let config = CompletionConfig {
            api_key: Some(SecretString::from("sk-very-secret")),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-very-secret"));
    }

    #[test]
    fn test_model_from_str() {
        assert_eq!("gpt-4o".parse::<CompletionModel>().unwrap(), CompletionModel::Gpt4o);
        let err = "claude".parse::<CompletionModel>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownModel(ref m) if m == "claude"));
    }

    #[test]
    fn test_validate_ranges() {
        assert!(CompletionConfig::default().validate().is_ok());

        let hot = CompletionConfig {
            temperature: 2.5,
            ..Default::default()
        };
        assert!(matches!(hot.validate(), Err(ConfigError::InvalidTemperature(_))));

        let wide = CompletionConfig {
            top_p: 1.1,
            ..Default::default()
        };
        assert!(matches!(wide.validate(), Err(ConfigError::InvalidTopP(_))));

        let capped = CompletionConfig {
            max_output_tokens: 0,
            ..Default::default()
        };
        assert!(matches!(capped.validate(), Err(ConfigError::ZeroMaxOutputTokens)));

        let closed = CompletionConfig {
            semaphore_rate: 0,
            ..Default::default()
        };
        assert!(matches!(
            closed.validate(),
            Err(ConfigError::InvalidCapacity(GateError::ZeroCapacity))
        ));
    }
}
