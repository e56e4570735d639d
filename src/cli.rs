//! CLI definitions for cronfleet.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// cronfleet CLI.
#[derive(Parser, Debug)]
#[command(name = "cronfleet")]
#[command(about = "Partitioned cron scheduler for a fixed fleet of instances")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    /// This instance's 1-based number, overrides `instance.number`
    #[arg(long, env = "CRONFLEET_INSTANCE_NUMBER", global = true)]
    pub instance_number: Option<u32>,

    /// Fleet size, overrides `instance.total`
    #[arg(long, env = "CRONFLEET_TOTAL_INSTANCES", global = true)]
    pub total_instances: Option<u32>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub(crate) enum Commands {
    /// Run the scheduler instance in foreground (default)
    Run,

    /// Load and validate the configuration, then exit
    CheckConfig,

    /// Print which instance owns a job id
    Owner {
        /// Persisted job id
        #[arg(long)]
        id: u64,

        /// Fleet size
        #[arg(long)]
        total: u32,
    },
}
