//! gamesmith - LLM-driven browser game generation
//!
//! A natural-language request goes through a fixed five-stage pipeline:
//! requirement analysis, architecture design, code generation, validation
//! and deployment. Each stage is a total function over [`PipelineState`];
//! failures become state (an error or a fallback log entry) rather than
//! aborting the run, and the state is checkpointed after every stage.
//!
//! # Example
//!
//! ```no_run
//! use gamesmith::llm::{ExchangeLog, GenAIClient};
//! use gamesmith::pipeline::{PipelineConfig, PipelineContext, PipelineOrchestrator};
//! use gamesmith::templates::{TemplateCorpus, TemplateRetriever};
//! use genai::adapter::AdapterKind;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = GenAIClient::new(
//!     AdapterKind::Ollama,
//!     "qwen2.5-coder:7b".to_string(),
//!     Duration::from_secs(120),
//! )?;
//! let retriever = TemplateRetriever::keyword_only(Arc::new(TemplateCorpus::with_defaults()));
//! let context = PipelineContext::new(
//!     Arc::new(client),
//!     Some(retriever),
//!     Arc::new(ExchangeLog::disabled()),
//!     PipelineConfig::default(),
//! );
//!
//! let state = PipelineOrchestrator::new(context)
//!     .run("alice", "做一个贪吃蛇游戏", None)
//!     .await?;
//! println!("{:?}", state.deployment_url);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod extraction;
pub mod fs;
pub mod llm;
pub mod pipeline;
pub mod progress;
pub mod templates;
pub mod util;
pub mod validation;

pub use config::{ConfigError, GamesmithConfig};
pub use extraction::{ExtractionError, StructuredExtractor};
pub use llm::{BackendError, GenAIClient, LLMClient, MockLLMClient};
pub use pipeline::{
    PipelineConfig, PipelineContext, PipelineError, PipelineOrchestrator, PipelineState,
    RunOutcome,
};
pub use templates::{TemplateCorpus, TemplateRecord, TemplateRetriever};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
