//! Transport port: the one operation the core needs from a remote API.
//!
//! `CompletionTransport` uses native async fn in traits (RPITIT), which is not
//! object-safe. `BoxTransport` restores dynamic dispatch with the usual
//! blanket-impl pattern:
//! 1. Define an object-safe `TransportDyn` trait with boxed futures
//! 2. Blanket-impl `TransportDyn` for all `T: CompletionTransport`
//! 3. `BoxTransport` wraps `Box<dyn TransportDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use llmgate_types::llm::{ChatRequest, ChatResponse, LlmError};

/// A remote chat-completion backend.
///
/// Implementations live in llmgate-infra (e.g., `OpenAiTransport`).
/// Errors returned here are remote failures; the transport does not look
/// at the response content beyond extracting the first choice's text.
pub trait CompletionTransport: Send + Sync {
    /// Human-readable transport name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send one chat completion request.
    fn create_completion(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, LlmError>> + Send;
}

/// Object-safe version of [`CompletionTransport`] with boxed futures.
pub trait TransportDyn: Send + Sync {
    fn name(&self) -> &str;

    fn create_completion_boxed<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, LlmError>> + Send + 'a>>;
}

impl<T: CompletionTransport> TransportDyn for T {
    fn name(&self) -> &str {
        CompletionTransport::name(self)
    }

    fn create_completion_boxed<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.create_completion(request))
    }
}

/// Type-erased transport so the facade is not generic over its backend.
pub struct BoxTransport {
    inner: Box<dyn TransportDyn + Send + Sync>,
}

impl BoxTransport {
    pub fn new<T: CompletionTransport + 'static>(transport: T) -> Self {
        Self {
            inner: Box::new(transport),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn create_completion(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        self.inner.create_completion_boxed(request).await
    }
}

impl std::fmt::Debug for BoxTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxTransport")
            .field("name", &self.name())
            .finish()
    }
}
