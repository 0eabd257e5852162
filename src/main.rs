use gamesmith::cli::commands::{CliArgs, Commands};
use gamesmith::cli::handlers::{handle_config, handle_generate, handle_resume, handle_templates};
use gamesmith::util::logging::{init_logging, parse_level, LoggingConfig};
use gamesmith::{NAME, VERSION};

use clap::Parser;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(logging_config(&args));

    debug!(version = VERSION, "{} starting", NAME);
    debug!(?args, "Parsed arguments");

    let code = match &args.command {
        Commands::Generate(generate) => handle_generate(generate, args.quiet).await,
        Commands::Resume(resume) => handle_resume(resume, args.quiet).await,
        Commands::Templates(templates) => handle_templates(templates).await,
        Commands::Config(config) => handle_config(config),
    };

    std::process::exit(code);
}

/// Flags win over the environment: `--log-level`, then `--verbose`, then `--quiet`
fn logging_config(args: &CliArgs) -> LoggingConfig {
    let mut config = LoggingConfig::from_env();
    if let Some(level) = &args.log_level {
        config.level = parse_level(level);
    } else if args.verbose {
        config.level = Level::DEBUG;
    } else if args.quiet {
        config.level = Level::ERROR;
    }
    config
}
