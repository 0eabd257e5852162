use super::error::BackendError;
use super::types::{LLMRequest, LLMResponse};
use async_trait::async_trait;

/// A model provider able to answer one single-turn request
///
/// Shared by every run behind an `Arc`, so implementations must be safe to
/// call concurrently.
#[async_trait]
pub trait LLMClient: Send + Sync {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError>;

    /// Provider label used in logs and error messages
    fn name(&self) -> &str;

    fn model(&self) -> Option<&str> {
        None
    }
}
