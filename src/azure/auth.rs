//! Client-secret authentication against Microsoft Entra ID.
//!
//! Credentials are read from the environment without validation. A missing
//! value surfaces as [`AzureError::AuthenticationFailed`] from the first token
//! request, which is the first management API call of a run.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{AzureError, Result, SampleError};

/// Environment variable holding the service principal client ID.
pub const CLIENT_ID_ENV: &str = "CLIENT_ID";
/// Environment variable holding the service principal secret.
pub const CLIENT_SECRET_ENV: &str = "CLIENT_SECRET";
/// Environment variable holding the Entra ID tenant.
pub const TENANT_ID_ENV: &str = "TENANT_ID";
/// Environment variable holding the target subscription.
pub const SUBSCRIPTION_ID_ENV: &str = "SUBSCRIPTION_ID";

/// Scope requested for Resource Manager tokens.
const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN_SECS: i64 = 300;

/// Service principal credentials.
#[derive(Clone, Default)]
pub struct AzureCredentials {
    /// Application (client) ID.
    pub client_id: String,
    /// Client secret.
    pub client_secret: String,
    /// Tenant ID.
    pub tenant_id: String,
    /// Subscription ID.
    pub subscription_id: String,
}

impl std::fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

impl AzureCredentials {
    /// Reads the four credential variables. Missing variables become empty
    /// strings.
    #[must_use]
    pub fn from_env() -> Self {
        let read = |name: &str| {
            std::env::var(name).unwrap_or_else(|_| {
                debug!("{name} is not set");
                String::new()
            })
        };

        Self {
            client_id: read(CLIENT_ID_ENV),
            client_secret: read(CLIENT_SECRET_ENV),
            tenant_id: read(TENANT_ID_ENV),
            subscription_id: read(SUBSCRIPTION_ID_ENV),
        }
    }

    /// Names of the variables that are empty.
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (CLIENT_ID_ENV, &self.client_id),
            (CLIENT_SECRET_ENV, &self.client_secret),
            (TENANT_ID_ENV, &self.tenant_id),
            (SUBSCRIPTION_ID_ENV, &self.subscription_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// A bearer token and its expiry.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The raw token.
    pub token: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Returns true if the token should be refreshed.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        Utc::now() + ChronoDuration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
}

/// Token endpoint error response.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Client-secret credential with a cached token.
#[derive(Debug, Clone)]
pub struct ClientSecretCredential {
    /// HTTP client.
    client: Client,
    /// Service principal credentials.
    credentials: AzureCredentials,
    /// Authority host, e.g. `https://login.microsoftonline.com`.
    authority: String,
    /// Cached token, shared between clones.
    cache: Arc<Mutex<Option<AccessToken>>>,
}

impl ClientSecretCredential {
    /// Creates a credential that authenticates against `authority`.
    #[must_use]
    pub fn new(client: Client, credentials: AzureCredentials, authority: &str) -> Self {
        Self {
            client,
            credentials,
            authority: authority.trim_end_matches('/').to_string(),
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Subscription the credential is scoped to.
    #[must_use]
    pub fn subscription_id(&self) -> &str {
        &self.credentials.subscription_id
    }

    /// Returns a valid bearer token, requesting a new one when needed.
    ///
    /// # Errors
    ///
    /// Returns an authentication error if credentials are missing or the
    /// token endpoint rejects them.
    pub async fn token(&self) -> Result<String> {
        let mut cache = self.cache.lock().await;

        if let Some(token) = cache.as_ref().filter(|t| !t.is_stale()) {
            return Ok(token.token.clone());
        }

        let token = self.request_token().await?;
        let raw = token.token.clone();
        *cache = Some(token);
        Ok(raw)
    }

    /// Requests a token from the authority.
    async fn request_token(&self) -> Result<AccessToken> {
        let missing = self.credentials.missing();
        if !missing.is_empty() {
            return Err(SampleError::Azure(AzureError::authentication(format!(
                "credential variables not set: {}",
                missing.join(", ")
            ))));
        }

        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority, self.credentials.tenant_id
        );
        debug!("Requesting management token from {url}");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("scope", MANAGEMENT_SCOPE),
            ])
            .send()
            .await
            .map_err(|e| AzureError::network(format!("Token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TokenErrorResponse>(&body).map_or_else(
                |_| format!("token endpoint returned {status}"),
                |e| format!("{}: {}", e.error, e.error_description),
            );
            return Err(SampleError::Azure(AzureError::authentication(message)));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AzureError::invalid_response(format!("Failed to parse token: {e}")))?;

        let expires_in = body
            .expires_in
            .as_ref()
            .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
            .unwrap_or(3600);

        info!("Acquired management token for tenant {}", self.credentials.tenant_id);

        Ok(AccessToken {
            token: body.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(expires_in),
        })
    }
}
