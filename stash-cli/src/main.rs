use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod output;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "payloadstash", version, about = "Declarative HTTP request runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command));
    std::process::exit(exit_code);
}

async fn run_command(command: Command) -> i32 {
    match command {
        Command::Run {
            config,
            out,
            dry_run,
            yes,
            concurrent_delay,
            secrets,
            output,
        } => {
            cmd::run::run_cmd(
                &config,
                &out,
                cmd::run::RunFlags {
                    dry_run,
                    yes,
                    concurrent_delay,
                },
                secrets,
                output,
            )
            .await
        }
        Command::Validate {
            config,
            write_resolved,
            secrets,
            output,
        } => cmd::validate::validate_cmd(&config, write_resolved, secrets, output),
    }
}
