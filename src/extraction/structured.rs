use super::json_block::{self, JsonBlockResult};
use crate::llm::{BackendError, ExchangeLog, LLMClient, LLMRequest, ResponseSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// A structured call that did not produce a schema-conforming value
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("model call failed: {0}")]
    Backend(#[from] BackendError),

    #[error("model returned no JSON")]
    Empty { raw: String },

    #[error("model output is not valid JSON: {message}")]
    Malformed { message: String, raw: String },

    #[error("model output does not match {schema}: {message}")]
    SchemaMismatch {
        schema: String,
        message: String,
        raw: String,
    },
}

impl ExtractionError {
    /// Raw model text, when the call got that far
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            ExtractionError::Backend(_) => None,
            ExtractionError::Empty { raw }
            | ExtractionError::Malformed { raw, .. }
            | ExtractionError::SchemaMismatch { raw, .. } => Some(raw),
        }
    }
}

/// A record the model can be asked to produce
///
/// `schema` is the JSON Schema of the serialized form; every listed property
/// should be required, since [`parse_structured`] rejects partial values.
pub trait StructuredOutput: DeserializeOwned {
    const NAME: &'static str;

    fn schema() -> Value;
}

/// Builds the schema descriptor sent with a structured request
pub fn descriptor_for<T: StructuredOutput>() -> ResponseSchema {
    ResponseSchema {
        name: T::NAME.to_string(),
        schema: T::schema(),
    }
}

/// Wraps one model call with a declared output schema
///
/// The result is either a fully typed `T` or an [`ExtractionError`]; a value
/// missing any required field never gets through.
pub struct StructuredExtractor<'a> {
    client: &'a dyn LLMClient,
    exchange_log: &'a ExchangeLog,
    temperature: f32,
    max_tokens: u32,
}

impl<'a> StructuredExtractor<'a> {
    pub fn new(client: &'a dyn LLMClient, exchange_log: &'a ExchangeLog) -> Self {
        Self {
            client,
            exchange_log,
            temperature: 0.7,
            max_tokens: 2048,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub async fn extract<T>(
        &self,
        stage: &str,
        instruction: &str,
        payload: &str,
    ) -> Result<T, ExtractionError>
    where
        T: StructuredOutput,
    {
        let descriptor = descriptor_for::<T>();
        let system = format!(
            "{}\n\nRespond with a single JSON object that conforms to this JSON Schema. \
             Every field is required. Do not add commentary.\n{}",
            instruction.trim(),
            descriptor.schema
        );
        let schema_name = descriptor.name.clone();

        let request = LLMRequest::prompt(system, payload)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_response_schema(descriptor);

        let start = Instant::now();
        let response = self.client.chat(request.clone()).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let response = match response {
            Ok(response) => {
                self.exchange_log
                    .record(stage, &request, Ok(&response), latency_ms);
                response
            }
            Err(e) => {
                self.exchange_log
                    .record(stage, &request, Err(e.to_string().as_str()), latency_ms);
                return Err(e.into());
            }
        };

        debug!(
            stage,
            latency_ms,
            chars = response.content.len(),
            "Structured response received"
        );

        parse_structured(&schema_name, &response.content)
    }
}

/// Parses raw model text into `T`, keeping the raw text on failure
pub fn parse_structured<T: DeserializeOwned>(
    schema_name: &str,
    raw: &str,
) -> Result<T, ExtractionError> {
    let value = match json_block::parse(raw) {
        JsonBlockResult::Parsed { value, .. } => value,
        JsonBlockResult::Empty => {
            return Err(ExtractionError::Empty {
                raw: raw.to_string(),
            })
        }
        JsonBlockResult::Malformed { error, .. } => {
            warn!("Unparsable structured output for {}: {}", schema_name, error);
            return Err(ExtractionError::Malformed {
                message: error,
                raw: raw.to_string(),
            });
        }
    };

    serde_json::from_value(value).map_err(|e| ExtractionError::SchemaMismatch {
        schema: schema_name.to_string(),
        message: e.to_string(),
        raw: raw.to_string(),
    })
}
