//! Card registration walkthrough.
//!
//! Runs the registration steps one by one instead of calling
//! `register_card_flow`, to show what happens to the key material.
//!
//! # Running this example
//!
//! ```bash
//! export CARDLINK_CLIENT_ID=<client id>
//! export CARDLINK_CLIENT_SECRET=<client secret>
//! cargo run --example register_card -- cardlink.toml
//! ```

#![allow(clippy::print_stdout, reason = "examples are allowed to use println")]

use cardlink_sdk::{
    Credential, PlatformClient, SdkConfig,
    card::{Address, CardData},
    crypto::{derive_shared_secret, encrypt_card_data, generate_key_pair},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "cardlink.toml".to_owned());
    let config = SdkConfig::from_file(&path)?;
    let credential = Credential::from_env(&config.credentials)?;
    let client = PlatformClient::connect(&config, credential).await?;

    // Sandbox test card
    let card = CardData::new("4111111111111111", "12", "2030", "123", "Jane Doe")
        .with_billing_address(Address {
            line1: "1 Main Street".to_owned(),
            city: "Springfield".to_owned(),
            postal_code: "12345".to_owned(),
            country_code: "US".to_owned(),
            ..Address::default()
        });

    // 1. Discover endpoints
    client.refresh_links().await?;

    // 2. Ephemeral key pair, used for this registration only
    let key_pair = generate_key_pair()?;
    println!("Ephemeral public key: {}...", &key_pair.public_key()[..32]);

    // 3. Exchange keys
    let exchange = client.exchange_keys(key_pair.public_key()).await?;
    println!("Platform key {} (active: {})", exchange.key_id, exchange.active);

    // 4. Agree on a secret and encrypt; both the secret and the private key
    //    are zeroized once dropped
    let secret = derive_shared_secret(&exchange.server_public_key, key_pair.private_key())?;
    drop(key_pair);
    let envelope = encrypt_card_data(&card, secret, &exchange.key_id)?;
    println!("Envelope: {} bytes, 5 JWE segments", envelope.len());

    // 5. Submit
    let result = client.register_card(&envelope).await?;
    match result.primary_deep_link() {
        Some(link) => println!("Card {} registered, open {link}", card.last_four()),
        None => println!("Card {} registered, no deep link returned", card.last_four()),
    }
    for (platform, link) in &result.deep_links {
        println!("  {platform}: {link}");
    }

    Ok(())
}
