//! cronfleet - partitioned cron scheduler
//!
//! Main entry point for a cronfleet instance.

mod cli;
mod cmd_config;
mod cmd_owner;
mod server;

use clap::Parser;
use tracing::warn;

use cronfleet_config::ConfigValidator;

use cli::{Cli, Commands};
use cmd_config::{check_config, load_config};
use cmd_owner::describe_owner;
use server::{init_tracing, run_instance, BoxError};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Run) => {
            let config = load_config(&cli)?;
            let warnings = ConfigValidator::validate(&config).into_result()?;
            init_tracing(&config.logging)?;
            for warning in warnings {
                warn!("Configuration: {}", warning);
            }
            run_instance(config).await
        }
        Some(Commands::CheckConfig) => {
            let config = load_config(&cli)?;
            check_config(&cli.config, &config)
        }
        Some(Commands::Owner { id, total }) => {
            println!("{}", describe_owner(id, total)?);
            Ok(())
        }
    }
}
