//! Provider access through the `genai` crate
//!
//! One client type covers Ollama, OpenAI, Anthropic, Gemini, xAI and Groq.
//! Requests that declare a response schema ask the provider for JSON output
//! conforming to it.

use super::client::LLMClient;
use super::error::BackendError;
use super::types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
use async_trait::async_trait;
use genai::adapter::AdapterKind;
use genai::chat::{
    ChatMessage as GenAIChatMessage, ChatOptions, ChatRequest as GenAIChatRequest,
    ChatResponseFormat, JsonSpec,
};
use genai::resolver::{AuthData, Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Overrides the provider endpoint, e.g. a remote Ollama or an OpenAI-compatible gateway
pub const API_BASE_URL_ENV: &str = "GAMESMITH_API_BASE_URL";

pub struct GenAIClient {
    client: Client,
    provider: AdapterKind,
    model: String,
    timeout: Duration,
}

/// A genai client pinned to `endpoint` with the provider's usual key variable
fn client_for_endpoint(provider: AdapterKind, model: &str, endpoint: String) -> Client {
    let model = model.to_string();
    let resolver = ServiceTargetResolver::from_resolver_fn(
        move |_target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let auth = provider
                .default_key_env_name()
                .map(AuthData::from_env)
                .unwrap_or_else(|| AuthData::from_single(""));
            Ok(ServiceTarget {
                endpoint: Endpoint::from_owned(endpoint.clone()),
                auth,
                model: ModelIden::new(provider, &model),
            })
        },
    );

    Client::builder()
        .with_service_target_resolver(resolver)
        .build()
}

fn to_genai_message(message: &ChatMessage) -> GenAIChatMessage {
    match message.role {
        MessageRole::System => GenAIChatMessage::system(&message.content),
        MessageRole::User => GenAIChatMessage::user(&message.content),
    }
}

fn to_chat_options(request: &LLMRequest) -> ChatOptions {
    let mut options = ChatOptions::default();
    if let Some(temperature) = request.temperature {
        options = options.with_temperature(temperature as f64);
    }
    if let Some(max_tokens) = request.max_tokens {
        options = options.with_max_tokens(max_tokens);
    }
    if let Some(ref schema) = request.response_schema {
        options = options.with_response_format(ChatResponseFormat::JsonSpec(JsonSpec::new(
            schema.name.clone(),
            schema.schema.clone(),
        )));
    }
    options
}

impl GenAIClient {
    /// Builds a client; honors [`API_BASE_URL_ENV`] when set
    pub fn new(
        provider: AdapterKind,
        model: String,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        if model.trim().is_empty() {
            return Err(BackendError::Configuration {
                message: "model name must not be empty".to_string(),
            });
        }

        let client = match std::env::var(API_BASE_URL_ENV) {
            Ok(endpoint) if !endpoint.trim().is_empty() => {
                debug!(provider = provider.as_str(), endpoint = %endpoint, "Using custom endpoint");
                client_for_endpoint(provider, &model, endpoint)
            }
            _ => Client::default(),
        };

        debug!(
            provider = provider.as_str(),
            model = %model,
            timeout_secs = timeout.as_secs(),
            "Created model client"
        );

        Ok(Self {
            client,
            provider,
            model,
            timeout,
        })
    }
}

#[async_trait]
impl LLMClient for GenAIClient {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
        let provider = self.provider.as_str();
        let start = Instant::now();

        let genai_request =
            GenAIChatRequest::new(request.messages.iter().map(to_genai_message).collect());
        let options = to_chat_options(&request);

        let call = self
            .client
            .exec_chat(&self.model, genai_request, Some(&options));
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(provider, "Model request failed: {}", e);
                return Err(BackendError::Request {
                    provider: provider.to_string(),
                    message: e.to_string(),
                });
            }
            Err(_) => {
                warn!(provider, seconds = self.timeout.as_secs(), "Model request timed out");
                return Err(BackendError::timeout(provider, self.timeout.as_secs()));
            }
        };

        let content = response.first_text().unwrap_or_default();
        if content.trim().is_empty() {
            return Err(BackendError::EmptyResponse {
                provider: provider.to_string(),
            });
        }

        Ok(LLMResponse::new(content, start.elapsed()).with_model(self.model.clone()))
    }

    fn name(&self) -> &str {
        self.provider.as_str()
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
}

impl std::fmt::Debug for GenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAIClient")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}
