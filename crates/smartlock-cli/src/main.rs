mod cli;
mod config;
mod console;
mod daemon;
mod devices;
mod logging;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use crate::cli::{Cli, Commands};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, found) = Config::load(&cli.config)?;
    if let Some(listen) = cli.listen {
        config.admin.listen = listen;
    }

    logging::init(&config.logging)?;
    if found {
        info!(path = %cli.config.display(), "Loaded configuration");
    } else {
        debug!(path = %cli.config.display(), "No configuration file, using defaults");
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Reset => daemon::factory_reset(&config.storage),
        Commands::Cards { json } => daemon::print_cards(&config.storage, json),
        Commands::Run => {
            if cli.factory_reset {
                daemon::factory_reset(&config.storage)?;
            }
            daemon::run(config).await
        }
    }
}
