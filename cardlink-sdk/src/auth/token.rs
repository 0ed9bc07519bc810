//! Token lifecycle manager.

use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};
use zeroize::Zeroize;

use super::Credential;
use crate::{
    classify::{STATUS_UNAUTHORIZED, error_record},
    error::{Result, SdkError},
    transport::{Transport, TransportRequest, TransportResponse},
};

/// Form body of the client-credentials grant.
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "grant_type=client_credentials";

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Current bearer token plus a counter bumped on every successful refresh.
///
/// The counter lets a caller that observed a 401 detect that another caller
/// already replaced the token it was using.
struct TokenState {
    value: String,
    generation: u64,
}

impl Drop for TokenState {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

/// Transport decorator that injects and maintains a bearer token.
///
/// `TokenManager` holds another [`Transport`] and implements [`Transport`]
/// itself. Each call attaches `Authorization: Bearer <token>`; a `401`
/// response triggers exactly one token refresh and exactly one retry, and
/// the retried response is returned as-is.
///
/// Refreshes are single-flight: callers that hit a `401` concurrently
/// serialize on a refresh lock, and only the first performs the token fetch.
/// The others reuse the token it obtained.
///
/// # Examples
///
/// ```rust,no_run
/// use cardlink_sdk::{
///     auth::{Credential, TokenManager},
///     transport::{HttpTransport, Transport, TransportRequest},
/// };
///
/// # async fn example() -> cardlink_sdk::Result<()> {
/// let transport = HttpTransport::new()?;
/// let credential = Credential::new("issuer-42", "s3cr3t");
/// let manager =
///     TokenManager::new(transport, credential, "https://auth.example.com/oauth/token").await?;
///
/// let response = manager.execute(TransportRequest::get("https://api.example.com/")).await?;
/// println!("Status: {}", response.status);
/// # Ok(())
/// # }
/// ```
pub struct TokenManager<T> {
    inner: T,
    credential: Credential,
    auth_url: String,
    token: RwLock<TokenState>,
    refresh_lock: Mutex<()>,
}

impl<T: Transport> TokenManager<T> {
    /// Creates a manager and fetches the first token immediately.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Credentials`] if the authorization endpoint rejects
    /// the credential or returns no token, and [`SdkError::Http`] if the
    /// endpoint cannot be reached. No instance is returned on failure.
    pub async fn new(
        inner: T,
        credential: Credential,
        auth_url: impl Into<String>,
    ) -> Result<Self> {
        let auth_url = auth_url.into();
        let value = fetch_token(&inner, &credential, &auth_url).await?;
        info!(client_id = credential.client_id(), "obtained initial access token");

        Ok(Self {
            inner,
            credential,
            auth_url,
            token: RwLock::new(TokenState { value, generation: 0 }),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Forces a token refresh.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Credentials`] if the refresh is rejected. The
    /// previous token stays in place on failure.
    pub async fn refresh_token(&self) -> Result<()> {
        let generation = self.token.read().await.generation;
        self.refresh_after(generation).await.map(drop)
    }

    /// Number of successful refreshes since construction.
    pub async fn refresh_count(&self) -> u64 {
        self.token.read().await.generation
    }

    /// Returns the wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    async fn current_token(&self) -> (String, u64) {
        let state = self.token.read().await;
        (state.value.clone(), state.generation)
    }

    /// Replaces the token unless someone else already replaced the one at
    /// `seen_generation`, and returns the token to use.
    async fn refresh_after(&self, seen_generation: u64) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        {
            let state = self.token.read().await;
            if state.generation != seen_generation {
                debug!(generation = state.generation, "token already refreshed by another caller");
                return Ok(state.value.clone());
            }
        }

        let value = fetch_token(&self.inner, &self.credential, &self.auth_url).await?;

        let mut state = self.token.write().await;
        state.value.zeroize();
        state.value.clone_from(&value);
        state.generation += 1;
        info!(generation = state.generation, "access token refreshed");

        Ok(value)
    }
}

impl<T: Transport> Transport for TokenManager<T> {
    #[instrument(
        skip(self, request),
        fields(method = request.method.as_str(), path = %request.path())
    )]
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        let (token, generation) = self.current_token().await;

        let response = self.inner.execute(with_bearer(request.clone(), &token)).await?;
        if response.status != STATUS_UNAUTHORIZED {
            return Ok(response);
        }

        warn!("request unauthorized, refreshing token and retrying once");
        let token = self.refresh_after(generation).await?;

        self.inner.execute(with_bearer(request, &token)).await
    }

    fn protocol_name(&self) -> &'static str {
        self.inner.protocol_name()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for TokenManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("inner", &self.inner)
            .field("credential", &self.credential)
            .field("auth_url", &self.auth_url)
            .finish_non_exhaustive()
    }
}

fn with_bearer(request: TransportRequest, token: &str) -> TransportRequest {
    request.with_header("Authorization", format!("Bearer {token}"))
}

/// Runs the client-credentials grant through the undecorated transport.
#[instrument(skip(transport, credential), fields(client_id = credential.client_id()))]
async fn fetch_token<T: Transport>(
    transport: &T,
    credential: &Credential,
    auth_url: &str,
) -> Result<String> {
    let request = TransportRequest::post_form(auth_url, GRANT_TYPE_CLIENT_CREDENTIALS)
        .with_header("Authorization", credential.basic_auth_header());
    let path = request.path();

    let response = transport.execute(request).await?;

    if !response.is_success() {
        let record = error_record(&path, &response);
        warn!(status = response.status, request_id = %record.request_id, "token request rejected");
        return Err(SdkError::Credentials(record));
    }

    serde_json::from_slice::<TokenResponse>(&response.body)
        .ok()
        .and_then(|body| body.access_token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            SdkError::Credentials(
                error_record(&path, &response).with_summary("missing access_token in response"),
            )
        })
}
