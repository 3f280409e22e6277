use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use loot_cli::commands::{recipes, summary, watch};
use loot_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Reports go to stdout, so diagnostics stay on stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    match &cli.command {
        Some(Commands::Watch(args)) => {
            watch::run(&config, args)?;
        }
        Some(Commands::Summary { log, json }) => {
            summary::run(&mut std::io::stdout().lock(), &config, log, *json)?;
        }
        Some(Commands::Recipes) => {
            recipes::run(&mut std::io::stdout().lock(), &config.recipes)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
