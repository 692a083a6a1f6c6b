use super::{requested_services, Overrides};
use crate::config::Config;
use crate::errors::Result;
use crate::localstack::Localstack;
use colored::Colorize;
use std::env;

/// Start (or reuse) a Localstack container and wait until it is ready.
///
/// The container is left running; remove it with `lsh stop`.
pub fn run(overrides: &Overrides) -> Result<()> {
    let mut config = Config::load(&env::current_dir()?)?;
    overrides.apply(&mut config);
    let services = requested_services(&config)?;

    println!(
        "Starting {} with services: {}",
        format!("{}:{}", config.repository, config.tag).cyan(),
        services
    );

    let localstack = Localstack::from_config(services, &config)?;

    println!("{} Localstack is ready", "✓".green());
    println!("  Container: {}", localstack.container().id);
    if !localstack.container().name.is_empty() {
        println!("  Name:      {}", localstack.container().name.trim_start_matches('/'));
    }
    match localstack.endpoint_url() {
        Some(url) => println!("  Endpoint:  {}", url.bold()),
        None => println!("  Endpoint:  {}", "port 4566 is not published".yellow()),
    }

    Ok(())
}
