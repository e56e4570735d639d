//! Configuration loading and the check-config command.

use std::path::Path;

use cronfleet_config::{Config, ConfigLoader, ConfigValidator};

use crate::cli::Cli;
use crate::server::{resolve_config_path, BoxError};

/// Load the configuration file and apply command line overrides.
pub(crate) fn load_config(cli: &Cli) -> Result<Config, BoxError> {
    let path = resolve_config_path(&cli.config);
    let mut config = ConfigLoader::load(&path)?;
    apply_overrides(&mut config, cli.instance_number, cli.total_instances);
    Ok(config)
}

pub(crate) fn apply_overrides(
    config: &mut Config,
    instance_number: Option<u32>,
    total_instances: Option<u32>,
) {
    if let Some(number) = instance_number {
        config.instance.number = number;
    }
    if let Some(total) = total_instances {
        config.instance.total = total;
    }
}

/// Validate `config`, printing every finding. Fails if any error was found.
pub(crate) fn check_config(path: &Path, config: &Config) -> Result<(), BoxError> {
    let result = ConfigValidator::validate(config);

    for warning in &result.warnings {
        println!("warning: {}", warning);
    }
    for error in &result.errors {
        println!("error: {}", error);
    }

    if result.is_valid() {
        println!(
            "{}: ok (instance {}/{})",
            path.display(),
            config.instance.number,
            config.instance.total
        );
    }
    result.into_result()?;
    Ok(())
}
