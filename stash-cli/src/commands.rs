use std::path::PathBuf;

use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate, resolve and execute every sequence of a stash config.
    Run {
        config: PathBuf,
        /// Root folder for run artifacts.
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
        /// Resolve and log every request without sending it.
        #[arg(long)]
        dry_run: bool,
        /// Continue without the confirmation prompt.
        #[arg(long)]
        yes: bool,
        /// Apply DelaySeconds after each request of concurrent sequences too.
        #[arg(long)]
        concurrent_delay: bool,
        #[command(flatten)]
        secrets: SecretsArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Check a stash config without sending anything.
    Validate {
        config: PathBuf,
        /// Write `<stem>-resolved.yml` next to the config.
        #[arg(long)]
        write_resolved: bool,
        #[command(flatten)]
        secrets: SecretsArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}
