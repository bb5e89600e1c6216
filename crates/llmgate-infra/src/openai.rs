//! OpenAI chat-completions transport.
//!
//! [`OpenAiTransport`] implements the core `CompletionTransport` port on top of
//! [`async_openai`]. This is the only place that knows the remote wire schema:
//! requests are mapped from [`ChatRequest`], and responses are narrowed to
//! [`ChatResponse`] by reading `choices[0].message.content`.

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    CreateChatCompletionResponse, ResponseFormat as OaiResponseFormat, ResponseFormatJsonSchema,
};
use async_openai::Client;
use secrecy::{ExposeSecret, SecretString};

use llmgate_core::transport::CompletionTransport;
use llmgate_types::config::CompletionConfig;
use llmgate_types::llm::{
    ChatRequest, ChatResponse, LlmError, Message, MessageRole, ResponseFormat, Usage,
};

/// Transport for the OpenAI chat completions API (or a compatible endpoint).
///
/// # API Key Security
///
/// Does NOT derive Debug: the `async_openai::Client` holds the API key.
pub struct OpenAiTransport {
    client: Client<OpenAIConfig>,
}

impl OpenAiTransport {
    /// Create a transport.
    ///
    /// Without an explicit key, `async-openai` resolves one from the
    /// `OPENAI_API_KEY` environment variable.
    pub fn new(api_key: Option<&SecretString>, api_base: Option<&str>) -> Self {
        let mut openai_config = OpenAIConfig::new();
        if let Some(key) = api_key {
            openai_config = openai_config.with_api_key(key.expose_secret());
        }
        if let Some(base) = api_base {
            openai_config = openai_config.with_api_base(base);
        }

        Self {
            client: Client::with_config(openai_config),
        }
    }

    /// Create a transport using the credential and base URL of a facade config.
    pub fn from_config(config: &CompletionConfig) -> Self {
        Self::new(config.api_key.as_ref(), config.api_base.as_deref())
    }

    /// Build a [`CreateChatCompletionRequest`] from a [`ChatRequest`].
    ///
    /// Fails with [`LlmError::InvalidRequest`] when a message role is not one
    /// the chat completions API defines.
    fn build_request(request: &ChatRequest) -> Result<CreateChatCompletionRequest, LlmError> {
        let messages = request
            .messages
            .iter()
            .map(to_openai_message)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CreateChatCompletionRequest {
            model: request.model.as_str().to_string(),
            messages,
            temperature: Some(request.temperature),
            top_p: Some(request.top_p),
            max_completion_tokens: Some(request.max_tokens),
            response_format: request.response_format.as_ref().map(to_openai_format),
            ..Default::default()
        })
    }
}

impl CompletionTransport for OpenAiTransport {
    fn name(&self) -> &str {
        "openai"
    }

    async fn create_completion(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let oai_request = Self::build_request(request)?;

        let response = self
            .client
            .chat()
            .create(oai_request)
            .await
            .map_err(map_openai_error)?;

        Ok(into_chat_response(response))
    }
}

fn to_openai_message(msg: &Message) -> Result<ChatCompletionRequestMessage, LlmError> {
    let oai_msg = match &msg.role {
        MessageRole::System => {
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(msg.content.clone()),
                name: None,
            })
        }
        MessageRole::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
            name: None,
        }),
        MessageRole::Assistant => {
            #[allow(deprecated)]
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                    msg.content.clone(),
                )),
                refusal: None,
                name: None,
                audio: None,
                tool_calls: None,
                function_call: None,
            })
        }
        // Let the wire types decide which other roles exist (e.g. "developer").
        MessageRole::Other(role) => serde_json::from_value(serde_json::json!({
            "role": role,
            "content": msg.content,
        }))
        .map_err(|e| LlmError::InvalidRequest(format!("unsupported message role '{role}': {e}")))?,
    };
    Ok(oai_msg)
}

fn to_openai_format(format: &ResponseFormat) -> OaiResponseFormat {
    match format {
        ResponseFormat::JsonObject => OaiResponseFormat::JsonObject,
        ResponseFormat::JsonSchema {
            name,
            schema,
            strict,
        } => OaiResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: None,
                name: name.clone(),
                schema: Some(schema.clone()),
                strict: Some(*strict),
            },
        },
    }
}

/// Narrow a remote response to the fields the core uses.
fn into_chat_response(response: CreateChatCompletionResponse) -> ChatResponse {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content);

    let usage = response
        .usage
        .map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    ChatResponse {
        id: response.id,
        model: response.model,
        content,
        usage,
    }
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "invalid_api_key"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
            {
                LlmError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                LlmError::RateLimited
            } else if error_type == "invalid_request_error" {
                LlmError::InvalidRequest(api_err.message.clone())
            } else {
                LlmError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401) => LlmError::AuthenticationFailed,
            Some(429) => LlmError::RateLimited,
            _ => LlmError::Provider {
                message: err.to_string(),
            },
        },
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmgate_types::config::CompletionModel;

    fn request(response_format: Option<ResponseFormat>) -> ChatRequest {
        ChatRequest {
            model: CompletionModel::Gpt4oMini,
            temperature: 0.01,
            top_p: 1.0,
            max_tokens: 2048,
            messages: vec![Message::system("be terse"), Message::user("hi")],
            response_format,
        }
    }

    #[test]
    fn test_build_request_copies_parameters() {
        let oai_req = OpenAiTransport::build_request(&request(None)).unwrap();
        assert_eq!(oai_req.model, "gpt-4o-mini");
        assert_eq!(oai_req.messages.len(), 2);
        assert!(matches!(
            oai_req.messages[0],
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(oai_req.messages[1], ChatCompletionRequestMessage::User(_)));
        assert_eq!(oai_req.temperature, Some(0.01));
        assert_eq!(oai_req.top_p, Some(1.0));
        assert_eq!(oai_req.max_completion_tokens, Some(2048));
        assert!(oai_req.response_format.is_none());
        assert!(oai_req.stream.is_none());
    }

    #[test]
    fn test_build_request_json_object() {
        let oai_req = OpenAiTransport::build_request(&request(Some(ResponseFormat::JsonObject))).unwrap();
        assert!(matches!(
            oai_req.response_format,
            Some(OaiResponseFormat::JsonObject)
        ));
    }

    #[test]
    fn test_build_request_json_schema() {
        let schema = serde_json::json!({"type": "object", "properties": {}});
        let oai_req = OpenAiTransport::build_request(&request(Some(ResponseFormat::JsonSchema {
            name: "Person".to_string(),
            schema: schema.clone(),
            strict: true,
        })))
        .unwrap();

        match oai_req.response_format {
            Some(OaiResponseFormat::JsonSchema { json_schema }) => {
                assert_eq!(json_schema.name, "Person");
                assert_eq!(json_schema.schema, Some(schema));
                assert_eq!(json_schema.strict, Some(true));
            }
            other => panic!("expected json_schema format, got {other:?}"),
        }
    }

    #[test]
    fn test_assistant_role_maps_to_assistant_message() {
        let msg = to_openai_message(&Message::new(MessageRole::Assistant, "earlier answer")).unwrap();
        assert!(matches!(msg, ChatCompletionRequestMessage::Assistant(_)));
    }

    #[test]
    fn test_developer_role_is_forwarded() {
        let msg = to_openai_message(&Message::new(MessageRole::from("developer"), "rules")).unwrap();
        let wire = serde_json::to_value(&msg).unwrap();
        assert_eq!(wire["role"], "developer");
        assert_eq!(wire["content"], "rules");
    }

    #[test]
    fn test_unsupported_role_is_invalid_request() {
        for role in ["narrator", "USER"] {
            let err = to_openai_message(&Message::new(MessageRole::from(role), "hi")).unwrap_err();
            assert!(matches!(err, LlmError::InvalidRequest(ref m) if m.contains(role)));
            assert!(err.is_remote());
        }
    }

    #[tokio::test]
    async fn test_create_completion_rejects_unsupported_role_before_sending() {
        // Unroutable base URL: reaching the network would surface as a provider error.
        let transport = OpenAiTransport::new(
            Some(&SecretString::from("sk-test")),
            Some("http://127.0.0.1:9/v1"),
        );
        let mut req = request(None);
        req.messages.push(Message::new(MessageRole::from("narrator"), "hi"));

        let err = transport.create_completion(&req).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidRequest(_)));
    }

    #[test]
    fn test_into_chat_response_reads_first_choice() {
        let response: CreateChatCompletionResponse = serde_json::from_value(serde_json::json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1_700_000_000u32,
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [
                {
                    "index": 0,
                    "message": {"role": "assistant", "content": "{\"name\":\"Ada\",\"age\":37}"},
                    "finish_reason": "stop",
                    "logprobs": null
                },
                {
                    "index": 1,
                    "message": {"role": "assistant", "content": "ignored"},
                    "finish_reason": "stop",
                    "logprobs": null
                }
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 9, "total_tokens": 21}
        }))
        .unwrap();

        let narrowed = into_chat_response(response);
        assert_eq!(narrowed.id, "chatcmpl-123");
        assert_eq!(
            narrowed.content.as_deref(),
            Some("{\"name\":\"Ada\",\"age\":37}")
        );
        assert_eq!(narrowed.usage.input_tokens, 12);
        assert_eq!(narrowed.usage.output_tokens, 9);
    }

    #[test]
    fn test_into_chat_response_without_choices() {
        let response: CreateChatCompletionResponse = serde_json::from_value(serde_json::json!({
            "id": "chatcmpl-empty",
            "object": "chat.completion",
            "created": 1_700_000_000u32,
            "model": "gpt-4o",
            "choices": []
        }))
        .unwrap();

        let narrowed = into_chat_response(response);
        assert!(narrowed.content.is_none());
        assert_eq!(narrowed.usage, Usage::default());
    }

    #[test]
    fn test_from_config_uses_explicit_key() {
        let config = CompletionConfig {
            api_key: Some(SecretString::from("sk-test")),
            api_base: Some("http://localhost:8080/v1".to_string()),
            ..Default::default()
        };
        let transport = OpenAiTransport::from_config(&config);
        assert_eq!(transport.name(), "openai");
    }

    #[test]
    fn test_map_openai_error_api_auth() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "Incorrect API key provided".to_string(),
            r#type: Some("invalid_request_error".to_string()),
            param: None,
            code: Some("invalid_api_key".to_string()),
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, LlmError::AuthenticationFailed));
    }

    #[test]
    fn test_map_openai_error_rate_limit() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "Rate limit reached".to_string(),
            r#type: Some("requests".to_string()),
            param: None,
            code: Some("rate_limit_exceeded".to_string()),
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, LlmError::RateLimited));
    }

    #[test]
    fn test_map_openai_error_unsupported_role() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "Invalid value: 'narrator'".to_string(),
            r#type: Some("invalid_request_error".to_string()),
            param: Some("messages[0].role".to_string()),
            code: None,
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, LlmError::InvalidRequest(_)));
        assert!(err.is_remote());
    }

    #[test]
    fn test_map_openai_error_invalid_argument() {
        use async_openai::error::OpenAIError;
        let err = map_openai_error(OpenAIError::InvalidArgument("bad arg".to_string()));
        assert!(matches!(err, LlmError::InvalidRequest(_)));
    }
}
