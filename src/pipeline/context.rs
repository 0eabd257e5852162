//! Pipeline context for managing dependencies

use std::sync::Arc;

use crate::extraction::StructuredExtractor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::llm::{ExchangeLog, LLMClient};
use crate::templates::TemplateRetriever;
use crate::validation::Validator;

use super::config::PipelineConfig;

/// Context that owns all long-lived pipeline dependencies
pub struct PipelineContext {
    /// LLM client for communication
    pub llm_client: Arc<dyn LLMClient>,

    /// Template retrieval used by architecture design, if any
    pub retriever: Option<TemplateRetriever>,

    /// Record of every model exchange
    pub exchange_log: Arc<ExchangeLog>,

    /// Structural checks run by the validation stage
    pub validator: Arc<Validator>,

    /// File system abstraction used by deployment
    pub file_system: Arc<dyn FileSystem>,

    /// Pipeline configuration
    pub config: PipelineConfig,
}

impl PipelineContext {
    pub fn new(
        llm_client: Arc<dyn LLMClient>,
        retriever: Option<TemplateRetriever>,
        exchange_log: Arc<ExchangeLog>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            llm_client,
            retriever,
            exchange_log,
            validator: Arc::new(Validator::new()),
            file_system: Arc::new(RealFileSystem),
            config,
        }
    }

    pub fn with_file_system(mut self, file_system: Arc<dyn FileSystem>) -> Self {
        self.file_system = file_system;
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    /// Context without retrieval or exchange logging
    pub fn minimal(llm_client: Arc<dyn LLMClient>, config: PipelineConfig) -> Self {
        Self::new(llm_client, None, Arc::new(ExchangeLog::disabled()), config)
    }

    pub fn extractor(&self, max_tokens: u32) -> StructuredExtractor<'_> {
        StructuredExtractor::new(self.llm_client.as_ref(), &self.exchange_log)
            .with_temperature(self.config.temperature)
            .with_max_tokens(max_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLLMClient;
    use crate::templates::TemplateCorpus;

    #[test]
    fn test_context_creation() {
        let retriever = TemplateRetriever::keyword_only(Arc::new(TemplateCorpus::with_defaults()));
        let context = PipelineContext::new(
            Arc::new(MockLLMClient::new()),
            Some(retriever),
            Arc::new(ExchangeLog::disabled()),
            PipelineConfig::default(),
        );

        assert!(context.retriever.is_some());
        assert!(!context.exchange_log.is_enabled());
        assert_eq!(context.validator.rule_count(), 4);
    }

    #[test]
    fn test_minimal() {
        let context = PipelineContext::minimal(Arc::new(MockLLMClient::new()), PipelineConfig::default());
        assert!(context.retriever.is_none());
        assert_eq!(context.llm_client.name(), "MockLLM");
    }
}
