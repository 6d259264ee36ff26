// ABOUTME: Entry point for the ephemera CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use ephemera::config::{self, Config};
use ephemera::error::Result;
use ephemera::output::Output;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(cli.output_mode());
    let mode = output.mode();

    if let Err(e) = run(cli, output).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: Output) -> Result<()> {
    let cwd = env::current_dir()?;
    match cli.command {
        Commands::Init { registry, force } => {
            config::init_config(&cwd, registry.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Plan { path, repo, pr } => {
            let config = Config::discover(&cwd)?;
            commands::plan(&config, &path, &repo, pr, &output)
        }
        Commands::Create {
            repo_url,
            pr,
            token,
        } => {
            let config = Config::discover(&cwd)?;
            commands::create(&config, &repo_url, pr, token, output).await
        }
        Commands::Delete { pr } => {
            let config = Config::discover(&cwd)?;
            commands::delete(&config, pr, output).await
        }
    }
}
