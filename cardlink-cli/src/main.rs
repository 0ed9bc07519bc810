//! `cardlink`: command-line front end for the cardlink SDK.
//!
//! Reads an SDK configuration file, takes the client credentials from the
//! environment variables it names, and runs one platform operation. Results
//! are printed to stdout as JSON; logs go to stderr.
//!
//! ```text
//! cardlink --config cardlink.toml health
//! cardlink --config cardlink.toml links
//! cardlink --config cardlink.toml register --card card.json
//! ```

#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and josekit"
)]

mod observability;

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use cardlink_sdk::{
    Credential, PlatformClient, SdkConfig, SdkError, card::CardData, transport::http::SDK_VERSION,
};
use clap::{Parser, Subcommand};
use observability::{LogFormat, init_observability};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "cardlink")]
#[command(
    author,
    version,
    about = "Register payment cards with the cardlink platform",
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "CARDLINK_CONFIG", default_value = "cardlink.toml")]
    config: PathBuf,

    /// Log format: `pretty` or `json`.
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check platform health.
    Health,
    /// Discover and print the platform's endpoint links.
    Links,
    /// Register a card read from a JSON file.
    Register {
        /// Card JSON (`accountNumber`, `expiryMonth`, `expiryYear`,
        /// `securityCode`, `cardholderName`, optional `billingAddress`).
        #[arg(long)]
        card: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_observability(LogFormat::parse(&cli.log_format));

    match run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_failure(&e);
            ExitCode::FAILURE
        }
    }
}

/// A parsed command with its inputs loaded.
enum Operation {
    Health,
    Links,
    Register(CardData),
}

async fn run(cli: Cli) -> Result<String> {
    // Inputs are read before any network traffic.
    let operation = match cli.command {
        Command::Health => Operation::Health,
        Command::Links => Operation::Links,
        Command::Register { card } => Operation::Register(read_card(&card)?),
    };

    let config = SdkConfig::from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let credential = Credential::from_env(&config.credentials)?;
    info!(
        base_url = %config.base_url,
        client_id = credential.client_id(),
        sdk = SDK_VERSION,
        "connecting"
    );

    let client = PlatformClient::connect(&config, credential).await?;

    let output = match operation {
        Operation::Health => {
            let health = client.health().await?;
            serde_json::json!({
                "status": health.status,
                "httpStatus": health.http_status,
                "up": health.is_up(),
                "sdkVersion": SDK_VERSION,
            })
        }
        Operation::Links => serde_json::to_value(&*client.refresh_links().await?)?,
        Operation::Register(card) => serde_json::to_value(client.register_card_flow(&card).await?)?,
    };

    Ok(serde_json::to_string_pretty(&output)?)
}

fn read_card(path: &Path) -> Result<CardData> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading card file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing card file {}", path.display()))
}

fn report_failure(e: &anyhow::Error) {
    match e.downcast_ref::<SdkError>().and_then(SdkError::record) {
        Some(record) => error!(
            path = %record.path,
            status = record.status,
            ray_id = %record.ray_id,
            request_id = %record.request_id,
            "{e:#}"
        ),
        None => error!("{e:#}"),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_register_requires_card() {
        let result = Cli::try_parse_from(["cardlink", "register"]);
        assert!(result.is_err());

        let args = ["cardlink", "--config", "c.toml", "register", "--card", "card.json"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, PathBuf::from("c.toml"));
        assert!(matches!(
            cli.command,
            Command::Register { card } if card == PathBuf::from("card.json")
        ));
    }

    #[test]
    fn test_read_card_reports_missing_file() {
        let err = read_card(Path::new("/nonexistent/card.json")).unwrap_err();
        assert!(format!("{err:#}").contains("reading card file"));
    }
}
