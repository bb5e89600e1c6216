//! Completion facade: the configured entry point callers use.
//!
//! A facade owns its configuration, one [`AdmissionGate`] sized by
//! `semaphore_rate`, and a transport. Every outbound call holds a gate permit
//! for exactly the duration of the transport call; the permit is returned on
//! every exit path, including errors and cancellation of the caller's future.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use llmgate_types::config::CompletionConfig;
use llmgate_types::error::ConfigError;
use llmgate_types::llm::{ChatRequest, LlmError, Message, MessageRole, ResponseFormat};

use crate::gate::AdmissionGate;
use crate::structured::{decode_structured, json_schema_format};
use crate::transport::{BoxTransport, CompletionTransport};

/// Concurrency-bounded access to a chat-completion backend.
#[derive(Debug)]
pub struct CompletionFacade {
    config: CompletionConfig,
    gate: AdmissionGate,
    /// System message seed prepended to every request; empty without a prompt.
    base_messages: Vec<Message>,
    transport: BoxTransport,
}

impl CompletionFacade {
    /// Validate `config`, size the gate and compute the message seed.
    pub fn new(config: CompletionConfig, transport: BoxTransport) -> Result<Self, ConfigError> {
        config.validate()?;
        let gate = AdmissionGate::new(config.semaphore_rate)?;

        let base_messages = match config.system_prompt.as_deref() {
            Some(prompt) if !prompt.is_empty() => vec![Message::system(prompt)],
            _ => Vec::new(),
        };

        tracing::debug!(
            model = %config.model,
            capacity = config.semaphore_rate,
            transport = transport.name(),
            "completion facade created"
        );

        Ok(Self {
            config,
            gate,
            base_messages,
            transport,
        })
    }

    /// Convenience constructor boxing a concrete transport.
    pub fn with_transport<T: CompletionTransport + 'static>(
        config: CompletionConfig,
        transport: T,
    ) -> Result<Self, ConfigError> {
        Self::new(config, BoxTransport::new(transport))
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn base_messages(&self) -> &[Message] {
        &self.base_messages
    }

    /// Build the outbound request for one prompt.
    ///
    /// The message list is the base seed followed by the new turn; the prompt
    /// is passed through unchanged, including when empty.
    pub fn build_request(
        &self,
        prompt: &str,
        role: MessageRole,
        response_format: Option<ResponseFormat>,
    ) -> ChatRequest {
        let mut messages = Vec::with_capacity(self.base_messages.len() + 1);
        messages.extend(self.base_messages.iter().cloned());
        messages.push(Message::new(role, prompt));

        ChatRequest {
            model: self.config.model,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: self.config.max_output_tokens,
            messages,
            response_format,
        }
    }

    /// Complete `prompt` as a user turn and return the response text.
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.complete_as(prompt, MessageRole::User).await
    }

    /// Complete `prompt` sent with the given role.
    #[tracing::instrument(
        name = "complete",
        skip(self, prompt, role),
        fields(model = %self.config.model, role = %role)
    )]
    pub async fn complete_as(&self, prompt: &str, role: MessageRole) -> Result<String, LlmError> {
        let request = self.build_request(prompt, role, None);
        self.send(&request).await
    }

    /// Complete with a role given as a string.
    ///
    /// The role is not checked here; an unsupported one is rejected by the
    /// transport as a remote error.
    pub async fn complete_with_role(&self, prompt: &str, role: &str) -> Result<String, LlmError> {
        self.complete_as(prompt, MessageRole::from(role)).await
    }

    /// Complete `prompt` as a user turn, requesting a JSON object body and
    /// decoding it into `T`.
    pub async fn complete_structured<T: DeserializeOwned>(&self, prompt: &str) -> Result<T, LlmError> {
        self.complete_structured_as(prompt, MessageRole::User).await
    }

    /// Structured completion sent with the given role.
    #[tracing::instrument(
        name = "complete_structured",
        skip(self, prompt, role),
        fields(model = %self.config.model, role = %role, target = std::any::type_name::<T>())
    )]
    pub async fn complete_structured_as<T: DeserializeOwned>(
        &self,
        prompt: &str,
        role: MessageRole,
    ) -> Result<T, LlmError> {
        let request = self.build_request(prompt, role, Some(ResponseFormat::JsonObject));
        let content = self.send(&request).await?;
        decode_structured(&content)
    }

    /// Structured completion with a role given as a string, passed through
    /// unchecked like [`Self::complete_with_role`].
    pub async fn complete_structured_with_role<T: DeserializeOwned>(
        &self,
        prompt: &str,
        role: &str,
    ) -> Result<T, LlmError> {
        self.complete_structured_as(prompt, MessageRole::from(role))
            .await
    }

    /// Structured completion constrained by the JSON Schema of `T`.
    ///
    /// Decoding and validation are identical to [`Self::complete_structured`];
    /// the schema only narrows what the remote is asked to produce.
    #[tracing::instrument(
        name = "complete_with_schema",
        skip(self, prompt),
        fields(model = %self.config.model, target = std::any::type_name::<T>())
    )]
    pub async fn complete_with_schema<T: JsonSchema + DeserializeOwned>(
        &self,
        prompt: &str,
    ) -> Result<T, LlmError> {
        let format = json_schema_format::<T>()?;
        let request = self.build_request(prompt, MessageRole::User, Some(format));
        let content = self.send(&request).await?;
        decode_structured(&content)
    }

    /// Issue one transport call under a gate permit and extract the text.
    ///
    /// The permit is released as soon as the transport returns, before any
    /// decoding.
    async fn send(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let waited = std::time::Instant::now();
        let permit = self.gate.acquire().await;
        tracing::debug!(
            wait_ms = waited.elapsed().as_millis() as u64,
            in_flight = self.gate.in_flight(),
            "admitted"
        );

        let started = std::time::Instant::now();
        let result = self.transport.create_completion(request).await;
        self.gate.release(permit);

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "completion request failed");
                return Err(err);
            }
        };

        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            response_id = %response.id,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "completion received"
        );

        response.content.ok_or(LlmError::EmptyResponse)
    }
}
