// folio CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod exit_code;
mod output;

use exit_code::ExitCode;

#[derive(Parser)]
#[command(name = "folio", about = "Versioned wiki pages with diff-based history")]
struct Cli {
    #[command(flatten)]
    global: context::GlobalArgs,

    #[command(subcommand)]
    command: commands::Command,
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match commands::run(&cli.global, cli.command) {
        Ok(()) => ExitCode::Success.into(),
        Err(error) => ExitCode::from_error(&error).into(),
    }
}
