//! Health check against a cardlink platform.
//!
//! Connects with client credentials from the environment, discovers the
//! platform links and reports health.
//!
//! # Running this example
//!
//! ```bash
//! export CARDLINK_CLIENT_ID=<client id>
//! export CARDLINK_CLIENT_SECRET=<client secret>
//! export CARDLINK_BASE_URL=https://api.sandbox.cardlink.example.com/
//! export CARDLINK_AUTH_URL=https://auth.sandbox.cardlink.example.com/oauth/token
//! cargo run --example health_check
//! ```

#![allow(clippy::print_stdout, reason = "examples are allowed to use println")]

use std::env;

use cardlink_sdk::{Credential, PlatformClient, SdkConfig, SdkError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = SdkConfig::new(env::var("CARDLINK_BASE_URL")?, env::var("CARDLINK_AUTH_URL")?);
    let credential = Credential::from_env(&config.credentials)?;

    let client = match PlatformClient::connect(&config, credential).await {
        Ok(client) => client,
        Err(SdkError::Credentials(record)) => {
            println!("Credentials rejected (request id {})", record.request_id);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let links = client.refresh_links().await?;
    println!("Discovered {} links:", links.len());
    for (relation, url) in links.iter() {
        println!("  {relation:<16} {url}");
    }

    match client.health().await {
        Ok(health) => println!("Platform status: {} (HTTP {})", health.status, health.http_status),
        Err(SdkError::Maintenance(record)) => {
            println!("Platform in maintenance, retry later (ray id {})", record.ray_id);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
