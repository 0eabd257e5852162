pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, GenerateArgs, ResumeArgs, TemplatesCommand};
pub use output::{OutputFormat, OutputFormatter};
