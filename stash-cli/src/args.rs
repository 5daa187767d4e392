use std::path::PathBuf;

use clap::Args;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SecretsArgs {
    /// `.env`-style file of KEY=VALUE lines for `$secrets` references.
    #[arg(long, value_name = "FILE")]
    pub secrets: Option<PathBuf>,
}
