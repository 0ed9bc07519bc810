//! Endpoint navigator and registration workflow.

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::{
    links::{LinkMap, REL_ENCRYPTION_KEYS, REL_HEALTH, REL_PAYMENT_CARDS, REQUIRED_RELATIONS},
    models::{
        HealthStatus, KeyExchangeRecord, KeyExchangeRequest, RegistrationRequest,
        RegistrationResult, RootResource,
    },
};
use crate::{
    auth::{Credential, TokenManager},
    card::CardData,
    classify::{Parsed, classify, error_record},
    config::SdkConfig,
    crypto::{derive_shared_secret, encrypt_card_data, generate_key_pair},
    error::{ErrorRecord, Result, SdkError},
    transport::{HttpTransport, Transport, TransportRequest},
};

/// Summary used when the root resource lacks required relations.
pub const INCOMPATIBLE_CONTRACT: &str = "INCOMPATIBLE_CONTRACT";

/// Client for the card-provisioning platform.
///
/// Endpoint URLs are discovered from the root resource and cached. The cache
/// is an immutable [`LinkMap`] snapshot behind a lock: a refresh builds a new
/// map and swaps it in whole, or fails and leaves the old one in place.
///
/// Every request goes through the wrapped [`TokenManager`], so a stale token
/// is recovered transparently once per request.
///
/// # Examples
///
/// ```rust,no_run
/// use cardlink_sdk::{Credential, PlatformClient, SdkConfig, card::CardData};
///
/// # async fn example() -> cardlink_sdk::Result<()> {
/// let config = SdkConfig::from_file("cardlink.toml")?;
/// let credential = Credential::from_env(&config.credentials)?;
/// let client = PlatformClient::connect(&config, credential).await?;
///
/// let card = CardData::new("4111111111111111", "12", "2030", "123", "Jane Doe");
/// let result = client.register_card_flow(&card).await?;
/// println!("deep link: {:?}", result.primary_deep_link());
/// # Ok(())
/// # }
/// ```
pub struct PlatformClient<T> {
    transport: TokenManager<T>,
    root_url: String,
    links: RwLock<Arc<LinkMap>>,
}

impl PlatformClient<HttpTransport> {
    /// Builds an HTTP transport from `config`, obtains a token and returns a
    /// ready client.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Config`] for invalid configuration,
    /// [`SdkError::Credentials`] if the credential is rejected, and
    /// [`SdkError::Http`] if the authorization endpoint is unreachable.
    pub async fn connect(config: &SdkConfig, credential: Credential) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::with_config(&config.http)?;
        let tokens = TokenManager::new(transport, credential, config.auth_url.as_str()).await?;
        Ok(Self::new(tokens, config.base_url.as_str()))
    }
}

impl<T: Transport> PlatformClient<T> {
    /// Creates a client over an authenticated transport.
    ///
    /// No request is made; links are discovered on first use.
    #[must_use]
    pub fn new(transport: TokenManager<T>, root_url: impl Into<String>) -> Self {
        Self { transport, root_url: root_url.into(), links: RwLock::default() }
    }

    /// Returns the token manager.
    pub fn token_manager(&self) -> &TokenManager<T> {
        &self.transport
    }

    /// Returns the current link cache snapshot.
    pub async fn links(&self) -> Arc<LinkMap> {
        Arc::clone(&*self.links.read().await)
    }

    /// Fetches the root resource and returns its links without touching the
    /// cache.
    ///
    /// # Errors
    ///
    /// Returns the classified error if the root request fails.
    #[instrument(skip(self), fields(root = %self.root_url))]
    pub async fn get_root(&self) -> Result<LinkMap> {
        let parsed: Parsed<RootResource> = self.send(TransportRequest::get(&self.root_url)).await?;
        Ok(parsed.value.into_link_map())
    }

    /// Fetches the root resource and replaces the link cache.
    ///
    /// The cache is replaced only if every relation in
    /// [`REQUIRED_RELATIONS`] is present.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Platform`] naming the missing relations if the
    /// platform does not serve a compatible contract, or the classified error
    /// if the root request fails. The cache is unchanged in both cases.
    #[instrument(skip(self), fields(root = %self.root_url))]
    pub async fn refresh_links(&self) -> Result<Arc<LinkMap>> {
        let request = TransportRequest::get(&self.root_url);
        let path = request.path();
        let response = self.transport.execute(request).await?;

        let links = classify::<RootResource>(&path, &response)?.value.into_link_map();
        let missing = links.missing(&REQUIRED_RELATIONS);
        if !missing.is_empty() {
            let missing = missing.join(", ");
            warn!(%missing, "root resource lacks required relations");
            return Err(SdkError::Platform(
                error_record(&path, &response)
                    .with_summary(INCOMPATIBLE_CONTRACT)
                    .with_description(format!("missing required links: {missing}")),
            ));
        }

        let snapshot = Arc::new(links);
        *self.links.write().await = Arc::clone(&snapshot);
        info!(relations = snapshot.len(), "link cache refreshed");

        Ok(snapshot)
    }

    /// Returns the URL for `relation`, refreshing the cache once on a miss.
    ///
    /// # Errors
    ///
    /// Returns the refresh error, or [`SdkError::Platform`] if the relation is
    /// still unknown after a successful refresh.
    pub async fn ensure_link(&self, relation: &str) -> Result<String> {
        if let Some(url) = self.links.read().await.get(relation) {
            return Ok(url.to_owned());
        }

        debug!(relation, "link cache miss");
        let links = self.refresh_links().await?;
        links.get(relation).map(str::to_owned).ok_or_else(|| {
            SdkError::Platform(
                ErrorRecord::minimal(TransportRequest::get(&self.root_url).path(), 0)
                    .with_summary(INCOMPATIBLE_CONTRACT)
                    .with_description(format!("unknown relation: {relation}")),
            )
        })
    }

    /// Checks platform health.
    ///
    /// # Errors
    ///
    /// Returns the classified error of the health request.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self.ensure_link(REL_HEALTH).await?;
        let parsed: Parsed<HealthStatus> = self.send(TransportRequest::get(url)).await?;
        Ok(HealthStatus { http_status: parsed.status, ..parsed.value })
    }

    /// Submits an ephemeral public key and returns the platform key to agree
    /// with.
    ///
    /// # Errors
    ///
    /// Returns the link resolution error or the classified error of the
    /// exchange request.
    #[instrument(skip(self, public_key))]
    pub async fn exchange_keys(&self, public_key: &str) -> Result<KeyExchangeRecord> {
        let url = self.ensure_link(REL_ENCRYPTION_KEYS).await?;
        let body = KeyExchangeRequest { client_public_key: public_key };
        let parsed: Parsed<KeyExchangeRecord> = self.send(json_post(url, &body)?).await?;

        let record = parsed.value;
        debug!(key_id = %record.key_id, active = record.active, "platform key received");
        Ok(record)
    }

    /// Submits an encrypted card payload.
    ///
    /// # Errors
    ///
    /// Returns the link resolution error or the classified error of the
    /// registration request.
    #[instrument(skip(self, encrypted_payload))]
    pub async fn register_card(&self, encrypted_payload: &str) -> Result<RegistrationResult> {
        let url = self.ensure_link(REL_PAYMENT_CARDS).await?;
        let body = RegistrationRequest { encrypted_data: encrypted_payload };
        let parsed: Parsed<RegistrationResult> = self.send(json_post(url, &body)?).await?;
        Ok(parsed.value)
    }

    /// Registers a card end to end.
    ///
    /// Refreshes links, generates an ephemeral key pair, exchanges keys,
    /// derives the shared secret, encrypts the card under the returned key id
    /// and submits it. The first failing step aborts the rest; the platform
    /// receives card data only in the last step.
    ///
    /// # Errors
    ///
    /// Returns the error of the first step that fails.
    #[instrument(skip(self, card), fields(last_four = card.last_four()))]
    pub async fn register_card_flow(&self, card: &CardData) -> Result<RegistrationResult> {
        self.refresh_links().await?;

        let key_pair = generate_key_pair()?;
        let exchange = self.exchange_keys(key_pair.public_key()).await?;
        let secret = derive_shared_secret(&exchange.server_public_key, key_pair.private_key())?;
        drop(key_pair);

        let payload = encrypt_card_data(card, secret, &exchange.key_id)?;
        let result = self.register_card(&payload).await?;

        info!(key_id = %exchange.key_id, "card registered");
        Ok(result)
    }

    async fn send<R: DeserializeOwned>(&self, request: TransportRequest) -> Result<Parsed<R>> {
        let path = request.path();
        let response = self.transport.execute(request).await?;
        classify(&path, &response)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for PlatformClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformClient")
            .field("transport", &self.transport)
            .field("root_url", &self.root_url)
            .finish_non_exhaustive()
    }
}

fn json_post<B: Serialize>(url: String, body: &B) -> Result<TransportRequest> {
    let bytes = serde_json::to_vec(body)
        .map_err(|e| SdkError::Internal(format!("request serialization failed: {e}")))?;
    Ok(TransportRequest::post_json(url, bytes))
}
