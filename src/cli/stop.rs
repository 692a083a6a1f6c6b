use super::{required_name, Overrides};
use crate::config::Config;
use crate::errors::Result;
use crate::localstack::{find_existing, purge_container};
use crate::runtime::DockerCli;
use colored::Colorize;
use std::env;

/// Remove the named Localstack container
pub fn run(overrides: &Overrides) -> Result<()> {
    let mut config = Config::load(&env::current_dir()?)?;
    overrides.apply(&mut config);
    let name = required_name(&config)?;

    let runtime = DockerCli::new();
    let container = match find_existing(&runtime, Some(&name), &config.repository, &config.tag)? {
        Some(container) => container,
        None => {
            println!(
                "No container named '{}' running {}:{}",
                name, config.repository, config.tag
            );
            return Ok(());
        }
    };

    purge_container(&runtime, &container.id)?;

    println!("{} Removed '{}' ({})", "✓".green(), name, container.id);
    Ok(())
}
