//! A short read-only tour of the client: sites, legacy device stats and
//! network health, all inside one session scope.

use unifi_assist_api::UnifiClient;

use crate::cli::ExampleArgs;
use crate::error::CliError;

pub async fn handle(args: &ExampleArgs, client: &UnifiClient) -> Result<(), CliError> {
    let scope = client.enter()?;

    let sites = scope.list_sites().await?;
    println!("Available sites: {}", serde_json::to_string_pretty(&sites)?);

    let devices = scope.device_stats(&args.site).await?;
    println!("Device stats: {}", serde_json::to_string_pretty(&devices)?);

    let health = scope.network_health(&args.site).await?;
    println!("Network health: {}", serde_json::to_string_pretty(&health)?);

    Ok(())
}
