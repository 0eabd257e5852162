//! Command handlers; each returns the process exit code

use anyhow::{Context, Result};
use genai::adapter::AdapterKind;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::commands::{
    ConfigArgs, GenerateArgs, ModelArgs, OutputFormatArg, ResumeArgs, TemplatesCommand,
};
use super::output::{json_error, OutputFormatter};
use crate::config::GamesmithConfig;
use crate::llm::{ExchangeLog, LLMClient};
use crate::pipeline::{
    CheckpointStore, FileCheckpointStore, InMemoryCheckpointStore, JsonFileSink, PipelineContext,
    PipelineOrchestrator, PipelineState, RunOutcome, RunRecord, RunSink,
};
use crate::progress::LoggingHandler;
use crate::templates::{
    HashingEmbedder, InMemoryVectorIndex, TemplateCorpus, TemplateRetriever, VectorIndex,
};

/// Loads env config and applies command-line model overrides
pub fn resolve_config(overrides: &ModelArgs) -> Result<GamesmithConfig> {
    let mut config = GamesmithConfig::from_env()?;

    if let Some(provider) = overrides.backend {
        debug!("Provider explicitly set to: {:?}", provider);
        if overrides.model.is_none() && std::env::var("GAMESMITH_MODEL").is_err() {
            config.model = crate::config::default_model(provider).to_string();
        }
        config.provider = provider;
    }
    if let Some(ref model) = overrides.model {
        debug!("Model overridden to: {}", model);
        config.model = model.clone();
    }
    if let Some(timeout) = overrides.timeout {
        config.request_timeout_secs = timeout;
    }

    config.validate()?;
    Ok(config)
}

/// Vector tier over the built-in corpus, keyword-only when the index cannot be built
pub fn build_retriever() -> TemplateRetriever {
    let corpus = Arc::new(TemplateCorpus::with_defaults());
    match InMemoryVectorIndex::build(&corpus, Box::new(HashingEmbedder::default())) {
        Ok(index) => {
            debug!("Template vector index holds {} documents", index.len());
            TemplateRetriever::new(corpus, Some(Arc::new(index) as Arc<dyn VectorIndex>))
        }
        Err(e) => {
            warn!("Vector index unavailable, using keyword retrieval: {}", e);
            TemplateRetriever::keyword_only(corpus)
        }
    }
}

/// Wires a configured orchestrator around `client`
pub fn build_orchestrator(
    config: &GamesmithConfig,
    client: Arc<dyn LLMClient>,
    use_templates: bool,
) -> PipelineOrchestrator {
    let retriever = use_templates.then(build_retriever);
    let exchange_log = Arc::new(ExchangeLog::new(config.exchange_log.clone()));
    let context = PipelineContext::new(client, retriever, exchange_log, config.pipeline_config());

    let checkpoints: Arc<dyn CheckpointStore> = match config.checkpoint_dir {
        Some(ref dir) => Arc::new(FileCheckpointStore::new(dir.clone())),
        None => Arc::new(InMemoryCheckpointStore::new()),
    };

    PipelineOrchestrator::new(context)
        .with_checkpoints(checkpoints)
        .with_progress(Arc::new(LoggingHandler))
}

fn create_client(config: &GamesmithConfig) -> Result<Arc<dyn LLMClient>> {
    match config.create_client() {
        Ok(client) => Ok(Arc::new(client)),
        Err(e) => {
            print_backend_hints(config.provider);
            Err(e).context("Failed to initialize backend")
        }
    }
}

fn print_backend_hints(provider: AdapterKind) {
    eprintln!("\nPossible solutions:");
    match provider {
        AdapterKind::Ollama => {
            eprintln!("  - Ensure Ollama is running: ollama serve");
            eprintln!("  - Check OLLAMA_HOST environment variable (default: http://localhost:11434)");
        }
        AdapterKind::OpenAI => eprintln!("  - Set OPENAI_API_KEY environment variable"),
        AdapterKind::Anthropic => eprintln!("  - Set ANTHROPIC_API_KEY environment variable"),
        AdapterKind::Gemini => eprintln!("  - Set GEMINI_API_KEY environment variable"),
        AdapterKind::Xai => eprintln!("  - Set XAI_API_KEY environment variable"),
        AdapterKind::Groq => eprintln!("  - Set GROQ_API_KEY environment variable"),
        _ => eprintln!("  - Check provider-specific environment variables"),
    }
    eprintln!("  - Or pick another provider with --backend");
}

fn report_error(format: OutputFormatArg, e: &anyhow::Error) {
    error!("{:#}", e);
    if format == OutputFormatArg::Json {
        println!("{}", json_error(&format!("{:#}", e)));
    }
}

async fn store_record(record_dir: Option<&std::path::Path>, state: &PipelineState) -> Result<()> {
    if let Some(dir) = record_dir {
        let sink = JsonFileSink::new(dir);
        sink.store(&RunRecord::from_state(state)).await?;
        info!("Run record written to {}", sink.path_for(&state.thread_id).display());
    }
    Ok(())
}

fn finish(format: OutputFormatArg, quiet: bool, state: &PipelineState) -> Result<i32> {
    let output = OutputFormatter::new(format.into()).format_run(state)?;
    if !quiet || format == OutputFormatArg::Json {
        println!("{}", output);
    }
    Ok(match state.outcome() {
        RunOutcome::Failed => 1,
        _ => 0,
    })
}

pub async fn handle_generate(args: &GenerateArgs, quiet: bool) -> i32 {
    match generate(args, quiet).await {
        Ok(code) => code,
        Err(e) => {
            report_error(args.format, &e);
            1
        }
    }
}

async fn generate(args: &GenerateArgs, quiet: bool) -> Result<i32> {
    let config = resolve_config(&args.model)?;
    info!(
        provider = config.provider.as_str(),
        model = %config.model,
        "Starting game generation"
    );

    let client = create_client(&config)?;
    let orchestrator = build_orchestrator(&config, client, !args.no_templates);

    let state = orchestrator
        .run(&args.requester, &args.request, args.thread.as_deref())
        .await?;

    store_record(args.record_dir.as_deref(), &state).await?;
    finish(args.format, quiet, &state)
}

pub async fn handle_resume(args: &ResumeArgs, quiet: bool) -> i32 {
    match resume(args, quiet).await {
        Ok(code) => code,
        Err(e) => {
            report_error(args.format, &e);
            1
        }
    }
}

async fn resume(args: &ResumeArgs, quiet: bool) -> Result<i32> {
    let config = resolve_config(&args.model)?;
    if config.checkpoint_dir.is_none() {
        anyhow::bail!(
            "Resuming needs GAMESMITH_CHECKPOINT_DIR; in-memory checkpoints do not survive the process"
        );
    }

    let client = create_client(&config)?;
    let orchestrator = build_orchestrator(&config, client, true);

    let state = orchestrator
        .resume(&args.thread)
        .await
        .with_context(|| format!("Failed to resume thread {}", args.thread))?;

    store_record(args.record_dir.as_deref(), &state).await?;
    finish(args.format, quiet, &state)
}

pub async fn handle_templates(command: &TemplatesCommand) -> i32 {
    let (format, result) = match command {
        TemplatesCommand::Search(search) => {
            let retriever = if search.keyword_only {
                TemplateRetriever::keyword_only(Arc::new(TemplateCorpus::with_defaults()))
            } else {
                build_retriever()
            };
            let found = retriever.search(&search.query, search.k).await;
            (
                search.format,
                OutputFormatter::new(search.format.into()).format_templates(&found),
            )
        }
        TemplatesCommand::List(list) => {
            let corpus = TemplateCorpus::with_defaults();
            (
                list.format,
                OutputFormatter::new(list.format.into()).format_templates(corpus.all()),
            )
        }
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            report_error(format, &e);
            1
        }
    }
}

pub fn handle_config(args: &ConfigArgs) -> i32 {
    let result = resolve_config(&ModelArgs::default())
        .and_then(|config| OutputFormatter::new(args.format.into()).format_config(&config));

    match result {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            report_error(args.format, &e);
            eprintln!("\nPlease check your GAMESMITH_* environment variables.");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLLMClient;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_resolve_config_overrides() {
        let overrides = ModelArgs {
            backend: Some(AdapterKind::OpenAI),
            model: Some("gpt-4o".to_string()),
            timeout: Some(30),
        };

        let config = resolve_config(&overrides).unwrap();
        assert_eq!(config.provider, AdapterKind::OpenAI);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    #[serial]
    fn test_resolve_config_rejects_bad_timeout() {
        let overrides = ModelArgs {
            timeout: Some(0),
            ..ModelArgs::default()
        };
        assert!(resolve_config(&overrides).is_err());
    }

    #[tokio::test]
    async fn test_build_retriever_uses_vector_tier() {
        let retriever = build_retriever();
        let found = retriever.search("贪吃蛇", 1).await;
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_build_orchestrator_with_file_checkpoints() {
        let temp = TempDir::new().unwrap();
        let config = GamesmithConfig {
            checkpoint_dir: Some(temp.path().join("checkpoints")),
            projects_dir: temp.path().join("projects"),
            ..GamesmithConfig::default()
        };

        let orchestrator = build_orchestrator(&config, Arc::new(MockLLMClient::new()), false);
        assert!(orchestrator.context().retriever.is_none());
        assert_eq!(
            orchestrator.context().config.projects_dir,
            temp.path().join("projects")
        );

        let err = orchestrator.resume("nothing_here").await.unwrap_err();
        assert!(err.to_string().contains("nothing_here"));
    }

    #[tokio::test]
    async fn test_store_record() {
        let temp = TempDir::new().unwrap();
        let state = PipelineState::new("gen_u_1", "u", "snake");

        store_record(Some(temp.path()), &state).await.unwrap();
        assert!(temp.path().join("gen_u_1.json").exists());

        store_record(None, &state).await.unwrap();
    }
}
