use crate::endpoint::SDK_SERVICE_IDS;
use crate::errors::Result;
use crate::service::{AVAILABLE_SERVICES, EDGE_PORT};
use colored::Colorize;

/// Print the services Localstack can enable and the SDK identifiers routed to them
pub fn run() -> Result<()> {
    println!("{:<20} {:<20} {:<6}", "SERVICE", "SDK ID", "PORT");
    println!("{}", "-".repeat(48));

    for name in AVAILABLE_SERVICES {
        let sdk_ids: Vec<&str> = SDK_SERVICE_IDS
            .iter()
            .filter(|(_, service)| service == name)
            .map(|(id, _)| *id)
            .collect();
        let sdk_ids = if sdk_ids.is_empty() {
            "-".dimmed().to_string()
        } else {
            sdk_ids.join(", ")
        };
        println!("{:<20} {:<20} {:<6}", name, sdk_ids, EDGE_PORT);
    }

    Ok(())
}
