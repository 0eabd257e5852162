//! LLM client abstraction layer
//!
//! A trait-based seam so the pipeline can run against a real provider
//! (through `genai`) or a scripted mock in tests.

mod client;
mod error;
mod exchange_log;
mod genai;
mod mock;
mod types;

pub use client::LLMClient;
pub use error::BackendError;
pub use exchange_log::ExchangeLog;
pub use self::genai::{GenAIClient, API_BASE_URL_ENV};
pub use mock::{MockLLMClient, MockResponse};
pub use types::{ChatMessage, LLMRequest, LLMResponse, MessageRole, ResponseSchema};
