mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    info!(
        "🚀 helixdex CLI v{} starting up.",
        env!("CARGO_PKG_VERSION")
    );
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let command_result = match cli.command {
        Commands::Index(args) => {
            info!("Dispatching to 'index' command.");
            commands::index::run(args)
        }
        Commands::Strand(args) => {
            info!("Dispatching to 'strand' command.");
            commands::strand::run(args)
        }
        Commands::Fit(args) => {
            info!("Dispatching to 'fit' command.");
            commands::fit::run(args)
        }
        Commands::Peaks(args) => {
            info!("Dispatching to 'peaks' command.");
            commands::peaks::run(args)
        }
        Commands::Command(args) => {
            info!("Dispatching to 'command' command.");
            commands::command::run(args)
        }
    };

    match &command_result {
        Ok(_) => {
            info!("✅ Command completed successfully.");
            println!("✅ Command completed successfully.");
        }
        Err(e) => {
            error!("❌ Command failed: {}", e);
        }
    }

    command_result
}
