// ABOUTME: Entry point for the localinfra CLI application.
// ABOUTME: Parses arguments, loads config and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Context;
use localinfra::config::{self, Config};
use localinfra::error::Result;
use localinfra::output::{Output, OutputMode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = OutputMode::from_quiet(cli.quiet);

    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let data_dir = config::data_dir()?;
    let config = Config::discover(cli.config.as_deref(), &data_dir)?;

    let ctx = Context {
        config,
        data_dir,
        output: Output::new(mode),
    };

    match cli.command {
        Commands::Registry(command) => commands::registry(command, ctx).await,
        Commands::Mirror(command) => commands::mirror(command, ctx).await,
        Commands::Resolver(command) => commands::resolver(command, ctx).await,
    }
}
