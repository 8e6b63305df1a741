use std::time::Duration;

use async_lock::Mutex as AsyncMutex;
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::auth::TokenProvider;
use crate::credentials::ServiceAccountCredential;
use crate::error::{auth_failure, StoreResult};

pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3_600;
const EXPIRY_MARGIN_MS: i64 = 60_000;
const MINT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone, Debug)]
struct AccessToken {
    value: String,
    expires_at_ms: i64,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    scope: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Mints and caches OAuth2 bearer tokens for service-to-service calls.
///
/// One long-lived manager per process: every caller shares the cached token,
/// and the cache lock serializes refreshes so N concurrent callers inside a
/// refresh window produce exactly one exchange at the token endpoint.
pub struct AccessTokenManager {
    credential: ServiceAccountCredential,
    client: reqwest::Client,
    token_endpoint: String,
    scope: String,
    cached: AsyncMutex<Option<AccessToken>>,
}

impl AccessTokenManager {
    pub fn new(credential: ServiceAccountCredential) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(MINT_TIMEOUT)
            .build()
            .map_err(|err| auth_failure(err.to_string()))?;
        Ok(Self {
            credential,
            client,
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            scope: DATASTORE_SCOPE.to_string(),
            cached: AsyncMutex::new(None),
        })
    }

    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Returns a bearer token with at least 60 seconds of life left.
    ///
    /// A cached token inside that margin is returned without any network
    /// traffic. Otherwise a fresh token is minted while the cache lock is
    /// held; concurrent callers queue on the lock and pick up the newly
    /// cached token instead of issuing their own exchange. A failed mint
    /// leaves the cache exactly as it was, so the next call starts over.
    pub async fn get_access_token(&self) -> StoreResult<String> {
        let mut cached = self.cached.lock().await;
        let now_ms = Utc::now().timestamp_millis();
        if let Some(token) = cached.as_ref() {
            if token.expires_at_ms - now_ms > EXPIRY_MARGIN_MS {
                return Ok(token.value.clone());
            }
        }

        let minted = self.mint().await?;
        let value = minted.value.clone();
        *cached = Some(minted);
        Ok(value)
    }

    async fn mint(&self) -> StoreResult<AccessToken> {
        log::debug!(
            "minting access token for {}",
            self.credential.client_email()
        );
        let assertion = self.sign_assertion()?;

        let response = self
            .client
            .post(&self.token_endpoint)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await
            .map_err(|err| auth_failure(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| auth_failure(err.to_string()))?;

        if !status.is_success() {
            return Err(auth_failure(format!(
                "Token endpoint answered {status}: {body}"
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|err| auth_failure(format!("Invalid token response: {err}")))?;

        let now_ms = Utc::now().timestamp_millis();
        Ok(AccessToken {
            value: parsed.access_token,
            expires_at_ms: now_ms + (parsed.expires_in as i64) * 1_000,
        })
    }

    fn sign_assertion(&self) -> StoreResult<String> {
        let key = EncodingKey::from_rsa_pem(self.credential.private_key_pem().as_bytes())
            .map_err(|err| auth_failure(format!("Invalid service-account key: {err}")))?;

        let iat = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: self.credential.client_email(),
            sub: self.credential.client_email(),
            aud: &self.token_endpoint,
            scope: &self.scope,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|err| auth_failure(format!("Failed to sign assertion: {err}")))
    }

    #[cfg(test)]
    async fn seed_cached_token(&self, value: &str, expires_at_ms: i64) {
        let mut cached = self.cached.lock().await;
        *cached = Some(AccessToken {
            value: value.to_string(),
            expires_at_ms,
        });
    }
}

#[async_trait]
impl TokenProvider for AccessTokenManager {
    async fn bearer_token(&self) -> StoreResult<String> {
        self.get_access_token().await
    }
}
