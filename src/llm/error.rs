//! Transport failures of a model call
//!
//! Kept serializable so a failed call can be written to the exchange log and
//! carried inside a checkpointed state message.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendError {
    /// The provider rejected or failed the request
    Request { provider: String, message: String },

    Timeout { provider: String, seconds: u64 },

    /// The provider answered with no text at all
    EmptyResponse { provider: String },

    /// The client could not be set up (empty model name, bad endpoint)
    Configuration { message: String },

    Other { message: String },
}

impl BackendError {
    pub fn timeout(provider: impl Into<String>, seconds: u64) -> Self {
        BackendError::Timeout {
            provider: provider.into(),
            seconds,
        }
    }

    /// Whether retrying the same request could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BackendError::Timeout { .. } | BackendError::EmptyResponse { .. }
        )
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Request { provider, message } => {
                write!(f, "{} request failed: {}", provider, message)
            }
            BackendError::Timeout { provider, seconds } => {
                write!(f, "{} did not answer within {}s", provider, seconds)
            }
            BackendError::EmptyResponse { provider } => {
                write!(f, "{} returned an empty response", provider)
            }
            BackendError::Configuration { message } => {
                write!(f, "Configuration error: {}", message)
            }
            BackendError::Other { message } => f.write_str(message),
        }
    }
}

impl std::error::Error for BackendError {}
