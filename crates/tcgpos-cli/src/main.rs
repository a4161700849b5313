mod recurrence;
mod sales;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::recurrence::RecurrenceCommands;
use crate::sales::SalesCommands;

#[derive(Debug, Parser)]
#[command(name = "tcgpos-cli")]
#[command(about = "Recurring sale schedule tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check, describe, and build recurrence rules
    Recurrence {
        #[command(subcommand)]
        command: RecurrenceCommands,
    },
    /// Inspect the sales catalog
    Sales {
        #[command(subcommand)]
        command: SalesCommands,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = tcgpos_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Recurrence { command }) => {
            recurrence::run_recurrence(command, config.timezone)?;
        }
        Some(Commands::Sales { command }) => sales::run_sales(command, &config)?,
        None => println!("tcgpos-cli ready; see --help for commands"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
