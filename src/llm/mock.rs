use super::client::LLMClient;
use super::error::BackendError;
use super::types::{LLMRequest, LLMResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted answer
#[derive(Debug, Clone)]
pub enum MockResponse {
    Text(String),
    Error(BackendError),
}

impl MockResponse {
    pub fn text(content: impl Into<String>) -> Self {
        MockResponse::Text(content.into())
    }

    /// Serializes `value` as the response body
    pub fn json(value: serde_json::Value) -> Self {
        MockResponse::Text(value.to_string())
    }

    pub fn error(error: BackendError) -> Self {
        MockResponse::Error(error)
    }
}

/// Scripted client for tests: replays queued answers in order and keeps
/// every request it received
///
/// An exhausted queue answers with [`BackendError::Other`], so a stage that
/// calls the model more often than scripted fails visibly.
pub struct MockLLMClient {
    queue: Mutex<VecDeque<MockResponse>>,
    received: Mutex<Vec<LLMRequest>>,
    name: String,
}

impl MockLLMClient {
    pub fn new() -> Self {
        Self::with_name("MockLLM")
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            received: Mutex::new(Vec::new()),
            name: name.into(),
        }
    }

    pub fn add_response(&self, response: MockResponse) {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
    }

    pub fn add_responses(&self, responses: impl IntoIterator<Item = MockResponse>) {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(responses);
    }

    pub fn remaining_responses(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<LLMRequest> {
        self.received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for MockLLMClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
        self.received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let next = self.queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        match next {
            Some(MockResponse::Text(content)) => {
                Ok(LLMResponse::new(content, Duration::from_millis(10)).with_model("mock-model"))
            }
            Some(MockResponse::Error(error)) => Err(error),
            None => Err(BackendError::Other {
                message: format!("{}: no scripted response left", self.name),
            }),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> Option<&str> {
        Some("mock-model")
    }
}

impl std::fmt::Debug for MockLLMClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLLMClient")
            .field("name", &self.name)
            .field("remaining_responses", &self.remaining_responses())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order() {
        let client = MockLLMClient::new();
        client.add_responses(vec![
            MockResponse::json(serde_json::json!({"game_type": "贪吃蛇"})),
            MockResponse::text("<!DOCTYPE html>"),
        ]);
        assert_eq!(client.remaining_responses(), 2);

        let first = client.chat(LLMRequest::prompt("analyze", "snake")).await.unwrap();
        assert_eq!(first.content, r#"{"game_type":"贪吃蛇"}"#);
        assert_eq!(first.model.as_deref(), Some("mock-model"));

        let second = client.chat(LLMRequest::prompt("code", "snake")).await.unwrap();
        assert_eq!(second.content, "<!DOCTYPE html>");
        assert_eq!(client.remaining_responses(), 0);
    }

    #[tokio::test]
    async fn test_scripted_error() {
        let client = MockLLMClient::new();
        client.add_response(MockResponse::error(BackendError::timeout("MockLLM", 30)));

        let result = client.chat(LLMRequest::prompt("analyze", "snake")).await;
        assert_eq!(result.unwrap_err(), BackendError::timeout("MockLLM", 30));
    }

    #[tokio::test]
    async fn test_exhausted_queue_is_an_error() {
        let client = MockLLMClient::with_name("Scripted");

        let err = client
            .chat(LLMRequest::prompt("analyze", "snake"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Scripted"));
    }

    #[tokio::test]
    async fn test_records_requests_even_on_error() {
        let client = MockLLMClient::new();

        let _ = client.chat(LLMRequest::prompt("analyze", "打地鼠")).await;

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].payload(), Some("打地鼠"));
    }
}
