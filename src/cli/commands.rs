use clap::{Args, Parser, Subcommand, ValueEnum};
use genai::adapter::AdapterKind;
use std::path::PathBuf;

/// LLM-driven browser game generator
#[derive(Parser, Debug)]
#[command(
    name = "gamesmith",
    about = "Turn a natural-language game request into a playable browser game",
    version,
    author,
    long_about = "gamesmith runs a five-stage generation pipeline (requirement analysis, \
                  architecture design, code generation, validation, deployment) against an \
                  LLM provider (Ollama, OpenAI, Claude, Gemini, Grok, Groq) and writes the \
                  resulting game to the projects directory."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Generate a game from a request",
        long_about = "Runs the full pipeline for one request and deploys the result.\n\n\
                      Examples:\n  \
                      gamesmith generate \"做一个贪吃蛇游戏\"\n  \
                      gamesmith generate \"brick breaker with power-ups\" --requester alice\n  \
                      gamesmith generate \"打地鼠\" --format json --record-dir ./records\n  \
                      gamesmith generate \"tetris\" --backend openai --model gpt-4o-mini"
    )]
    Generate(GenerateArgs),

    #[command(
        about = "Resume a run from its last checkpoint",
        long_about = "Continues a run from the stage after its latest checkpoint. \
                      Requires GAMESMITH_CHECKPOINT_DIR so checkpoints outlive the process.\n\n\
                      Examples:\n  \
                      gamesmith resume gen_alice_1718000000"
    )]
    Resume(ResumeArgs),

    #[command(subcommand, about = "Inspect the reference template corpus")]
    Templates(TemplatesCommand),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

/// Model selection shared by commands that call the provider
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    #[arg(
        short = 'b',
        long,
        value_parser = parse_adapter_kind,
        help = "AI backend provider (overrides GAMESMITH_PROVIDER)"
    )]
    pub backend: Option<AdapterKind>,

    #[arg(
        short = 'm',
        long,
        value_name = "MODEL",
        help = "Model name (provider-specific, e.g. 'qwen2.5-coder:7b' for Ollama)"
    )]
    pub model: Option<String>,

    #[arg(long, value_name = "SECONDS", help = "Request timeout in seconds")]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(value_name = "REQUEST", help = "What game to build, in plain words")]
    pub request: String,

    #[arg(
        short = 'r',
        long,
        value_name = "ID",
        default_value = "cli",
        help = "Requester id (letters, digits, '-' or '_')"
    )]
    pub requester: String,

    #[arg(short = 't', long, value_name = "ID", help = "Explicit thread id")]
    pub thread: Option<String>,

    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        long,
        value_name = "DIR",
        help = "Write a run record (<thread>.json) into this directory"
    )]
    pub record_dir: Option<PathBuf>,

    #[arg(long, help = "Skip template retrieval during architecture design")]
    pub no_templates: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ResumeArgs {
    #[arg(value_name = "THREAD", help = "Thread id of the run to resume")]
    pub thread: String,

    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long, value_name = "DIR", help = "Write a run record into this directory")]
    pub record_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TemplatesCommand {
    #[command(about = "Rank templates for a query")]
    Search(TemplateSearchArgs),

    #[command(about = "List every template in the corpus")]
    List(TemplateListArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TemplateSearchArgs {
    #[arg(value_name = "QUERY")]
    pub query: String,

    #[arg(short = 'k', long, default_value = "3", help = "Number of results")]
    pub k: usize,

    #[arg(long, help = "Keyword scoring only, without the vector tier")]
    pub keyword_only: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Args, Debug, Clone)]
pub struct TemplateListArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_adapter_kind(s: &str) -> Result<AdapterKind, String> {
    crate::config::parse_provider(s).map_err(|e| e.to_string())
}
