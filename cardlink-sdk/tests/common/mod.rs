//! In-memory transports shared by the integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
};

use cardlink_sdk::{
    Credential, PlatformClient, Result, SdkError, TokenManager,
    card::CardData,
    crypto::{EphemeralKeyPair, derive_shared_secret, generate_key_pair},
    transport::{Method, Transport, TransportRequest, TransportResponse},
};
use josekit::jwe::A256GCMKW;
use serde_json::json;
use tracing_subscriber::EnvFilter;

pub const ROOT_URL: &str = "https://api.cardlink.test/";
pub const AUTH_URL: &str = "https://auth.cardlink.test/oauth/token";
pub const HEALTH_URL: &str = "https://api.cardlink.test/health";
pub const KEYS_URL: &str = "https://api.cardlink.test/encryption-keys";
pub const CARDS_URL: &str = "https://api.cardlink.test/payment-cards";

pub const CLIENT_ID: &str = "issuer-42";
pub const CLIENT_SECRET: &str = "s3cr3t";
pub const SERVER_KEY_ID: &str = "srv-key-1";

/// Routes SDK logs and spans to the test harness output.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cardlink_sdk=debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
}

pub fn credential() -> Credential {
    Credential::new(CLIENT_ID, CLIENT_SECRET)
}

pub fn token_body(value: &str) -> TransportResponse {
    let body = json!({ "access_token": value, "token_type": "bearer" });
    TransportResponse::new(200, body.to_string())
}

pub fn root_body(relations: &[(&str, &str)]) -> TransportResponse {
    let links: serde_json::Map<_, _> = relations
        .iter()
        .map(|(rel, href)| ((*rel).to_owned(), json!({ "href": href })))
        .collect();
    TransportResponse::new(200, json!({ "_links": links }).to_string())
}

pub fn full_root() -> TransportResponse {
    root_body(&[
        ("self", ROOT_URL),
        ("health", HEALTH_URL),
        ("encryptionKeys", KEYS_URL),
        ("paymentCards", CARDS_URL),
    ])
}

pub fn unauthorized() -> TransportResponse {
    TransportResponse::new(401, json!({ "summary": "UNAUTHORIZED" }).to_string())
        .with_header("x-request-id", "req-401")
}

/// Replays canned responses in order and records every request.
#[derive(Debug, Default)]
pub struct Scripted {
    responses: Mutex<VecDeque<TransportResponse>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl Scripted {
    pub fn new(responses: impl IntoIterator<Item = TransportResponse>) -> Self {
        Self { responses: Mutex::new(responses.into_iter().collect()), requests: Mutex::default() }
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|r| r.url == url).count()
    }
}

impl Transport for Scripted {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(request);
        Ok(self.responses.lock().unwrap().pop_front().expect("no scripted response left"))
    }

    fn protocol_name(&self) -> &'static str {
        "scripted"
    }
}

/// Answers from a script, except that every request to `down_url` fails
/// as if the host could not be reached.
#[derive(Debug)]
pub struct Unreachable {
    down_url: &'static str,
    script: Scripted,
}

impl Unreachable {
    pub fn new(
        down_url: &'static str,
        responses: impl IntoIterator<Item = TransportResponse>,
    ) -> Self {
        Self { down_url, script: Scripted::new(responses) }
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.script.requests()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.script.calls_to(url)
    }
}

impl Transport for Unreachable {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        if request.url == self.down_url {
            let url = request.url.clone();
            self.script.requests.lock().unwrap().push(request);
            return Err(SdkError::Transport(format!("connection refused: {url}")));
        }
        self.script.execute(request).await
    }

    fn protocol_name(&self) -> &'static str {
        "unreachable"
    }
}

/// Stateful stand-in for the platform.
///
/// Issues tokens, enforces bearer auth, serves links, publishes a server key
/// and decrypts submitted card envelopes with it.
#[derive(Debug)]
pub struct FakePlatform {
    server_keys: EphemeralKeyPair,
    state: Mutex<PlatformState>,
}

#[derive(Debug)]
pub struct PlatformState {
    pub requests: Vec<TransportRequest>,
    pub tokens_issued: u64,
    pub valid_token: Option<String>,
    pub links: Vec<(String, String)>,
    pub client_public_key: Option<String>,
    pub registered: Vec<CardData>,
    pub maintenance: bool,
    /// Published instead of the real server key when set.
    pub published_key: Option<String>,
}

impl FakePlatform {
    pub fn new() -> Self {
        let links = [
            ("self", ROOT_URL),
            ("health", HEALTH_URL),
            ("encryptionKeys", KEYS_URL),
            ("paymentCards", CARDS_URL),
        ]
        .into_iter()
        .map(|(rel, href)| (rel.to_owned(), href.to_owned()))
        .collect();

        Self {
            server_keys: generate_key_pair().unwrap(),
            state: Mutex::new(PlatformState {
                requests: Vec::new(),
                tokens_issued: 0,
                valid_token: None,
                links,
                client_public_key: None,
                registered: Vec::new(),
                maintenance: false,
                published_key: None,
            }),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap()
    }

    /// Invalidates the current token, as if it had expired.
    pub fn revoke_token(&self) {
        self.state().valid_token = Some("revoked".to_owned());
    }

    pub fn calls_to(&self, method: Method, url: &str) -> usize {
        self.state().requests.iter().filter(|r| r.method == method && r.url == url).count()
    }

    /// Decrypts an envelope the way the platform does, with the server
    /// private key and the client's public key.
    pub fn open_envelope(&self, jwe: &str, client_public_key: &str) -> Option<CardData> {
        let secret = derive_shared_secret(client_public_key, self.server_keys.private_key()).ok()?;
        let decrypter = A256GCMKW.decrypter_from_bytes(secret.as_bytes()).ok()?;
        let (payload, header) = josekit::jwe::deserialize_compact(jwe, &decrypter).ok()?;
        if header.key_id() != Some(SERVER_KEY_ID) || header.content_type() != Some("JWE") {
            return None;
        }
        serde_json::from_slice(&payload).ok()
    }

    fn route(&self, state: &mut PlatformState, request: &TransportRequest) -> TransportResponse {
        let request_id = format!("req-{}", state.requests.len());

        if state.maintenance {
            return TransportResponse::new(503, "")
                .with_header("maintenance-mode", "true")
                .with_header("x-request-id", request_id);
        }

        if request.url == AUTH_URL {
            return Self::issue_token(state, request);
        }

        let bearer = request.header("authorization").and_then(|h| h.strip_prefix("Bearer "));
        if bearer.is_none() || bearer != state.valid_token.as_deref() {
            return unauthorized().with_header("x-request-id", request_id);
        }

        let response = match (request.method, request.url.as_str()) {
            (Method::Get, ROOT_URL) => {
                let links: Vec<(&str, &str)> =
                    state.links.iter().map(|(r, h)| (r.as_str(), h.as_str())).collect();
                root_body(&links)
            }
            (Method::Get, HEALTH_URL) => TransportResponse::new(200, r#"{"status":"UP"}"#),
            (Method::Post, KEYS_URL) => self.exchange_keys(state, request),
            (Method::Post, CARDS_URL) => self.register(state, request),
            _ => TransportResponse::new(404, r#"{"summary":"NOT_FOUND"}"#),
        };
        response.with_header("x-request-id", request_id).with_header("cf-ray", "7f00-TST")
    }

    fn issue_token(state: &mut PlatformState, request: &TransportRequest) -> TransportResponse {
        if request.header("authorization") != Some(credential().basic_auth_header().as_str()) {
            return TransportResponse::new(401, r#"{"summary":"INVALID_CLIENT"}"#);
        }
        state.tokens_issued += 1;
        let token = format!("token-{}", state.tokens_issued);
        state.valid_token = Some(token.clone());
        token_body(&token)
    }

    fn exchange_keys(
        &self,
        state: &mut PlatformState,
        request: &TransportRequest,
    ) -> TransportResponse {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let Some(client_key) = body["clientPublicKey"].as_str() else {
            return TransportResponse::new(400, r#"{"summary":"BAD_REQUEST"}"#);
        };
        state.client_public_key = Some(client_key.to_owned());

        let record = json!({
            "keyId": SERVER_KEY_ID,
            "serverPublicKey": state
                .published_key
                .as_deref()
                .unwrap_or_else(|| self.server_keys.public_key()),
            "active": true,
            "createdTs": 1_760_000_000_000_i64,
            "expirationTs": 1_760_086_400_000_i64,
            "_links": { "self": { "href": format!("{KEYS_URL}/{SERVER_KEY_ID}") } }
        });
        TransportResponse::new(201, record.to_string())
    }

    fn register(&self, state: &mut PlatformState, request: &TransportRequest) -> TransportResponse {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let card = body["encryptedData"].as_str().zip(state.client_public_key.as_deref()).and_then(
            |(jwe, client_key)| self.open_envelope(jwe, client_key),
        );
        let Some(card) = card else {
            return TransportResponse::new(
                400,
                r#"{"summary":"DECRYPTION_FAILED","description":"cannot open envelope"}"#,
            );
        };

        state.registered.push(card);
        let id = state.registered.len();
        TransportResponse::new(
            201,
            json!({
                "deepLink": format!("cardlink://cards/{id}"),
                "deepLinks": {
                    "android": format!("cardlink://android/cards/{id}"),
                    "ios": format!("cardlink://ios/cards/{id}")
                }
            })
            .to_string(),
        )
    }
}

impl Transport for FakePlatform {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        let response = self.route(&mut state, &request);
        state.requests.push(request);
        Ok(response)
    }

    fn protocol_name(&self) -> &'static str {
        "fake-platform"
    }
}

pub async fn fake_client() -> PlatformClient<FakePlatform> {
    init_tracing();
    let tokens = TokenManager::new(FakePlatform::new(), credential(), AUTH_URL).await.unwrap();
    PlatformClient::new(tokens, ROOT_URL)
}

pub fn sample_card() -> CardData {
    CardData::new("4111111111111111", "12", "2030", "123", "Jane Doe")
}
