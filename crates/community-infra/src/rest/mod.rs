//! Client for the hosted REST backend (auth API + table API).
//!
//! Every request carries the project's anon key in the `apikey` header. The
//! `Authorization` bearer is the signed-in user's access token when one is
//! held, otherwise the anon key. The access token is persisted in its own
//! state slot, separate from the session store's slot.

mod auth;
mod tables;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;
use uuid::Uuid;

use community_core::ports::{QueryError, StateStore};
use community_shared::ErrorResponse;

/// Slot the access token is persisted under.
pub const TOKEN_STORAGE_KEY: &str = "fast-community-auth-token";

/// REST backend configuration.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project URL, e.g. `https://xyzcompany.example.co/`.
    pub url: Url,
    /// Public anon key of the project.
    pub anon_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum RestConfigError {
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Backend key must not be empty")]
    MissingKey,
}

impl RestConfig {
    pub fn new(url: &str, anon_key: impl Into<String>) -> Result<Self, RestConfigError> {
        let mut url = Url::parse(url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let anon_key = anon_key.into();
        if anon_key.trim().is_empty() {
            return Err(RestConfigError::MissingKey);
        }

        Ok(Self {
            url,
            anon_key,
            timeout: Duration::from_secs(10),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Returns `Ok(None)` when `COMMUNITY_API_URL` is not set.
    pub fn from_env() -> Result<Option<Self>, RestConfigError> {
        let Ok(url) = std::env::var("COMMUNITY_API_URL") else {
            return Ok(None);
        };
        let anon_key = std::env::var("COMMUNITY_API_KEY").unwrap_or_default();

        let mut config = Self::new(&url, anon_key)?;
        if let Some(secs) = std::env::var("COMMUNITY_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }

        Ok(Some(config))
    }
}

/// Access token of the signed-in user, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    user_id: Uuid,
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl StoredToken {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Hosted backend reached over HTTP.
pub struct RestBackend {
    http: reqwest::Client,
    config: RestConfig,
    storage: Arc<dyn StateStore>,
    token: RwLock<Option<StoredToken>>,
}

impl RestBackend {
    /// Build the client and restore a persisted access token, if any.
    pub async fn connect(
        config: RestConfig,
        storage: Arc<dyn StateStore>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        let token = match storage.get(TOKEN_STORAGE_KEY).await {
            Ok(Some(raw)) => serde_json::from_str::<StoredToken>(&raw)
                .map_err(|e| tracing::warn!(error = %e, "Discarding corrupt access token"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read access token");
                None
            }
        };

        tracing::info!(url = %config.url, has_token = token.is_some(), "REST backend ready");

        Ok(Self {
            http,
            config,
            storage,
            token: RwLock::new(token),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.config.url.join(path)
    }

    /// Attach the API key and the best available bearer token.
    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.token.read().await;
        let bearer = match token.as_ref() {
            Some(token) if !token.is_expired() => token.access_token.clone(),
            _ => self.config.anon_key.clone(),
        };

        request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }

    async fn store_token(&self, token: StoredToken) {
        match serde_json::to_string(&token) {
            Ok(raw) => {
                if let Err(e) = self.storage.set(TOKEN_STORAGE_KEY, &raw).await {
                    tracing::warn!(error = %e, "Failed to persist access token");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize access token"),
        }
        *self.token.write().await = Some(token);
    }

    async fn forget_token(&self) -> Option<StoredToken> {
        if let Err(e) = self.storage.delete(TOKEN_STORAGE_KEY).await {
            tracing::warn!(error = %e, "Failed to delete access token");
        }
        self.token.write().await.take()
    }
}

/// Read a failed response into its status and parsed error body.
async fn error_body(response: Response) -> (u16, ErrorResponse) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    (status, ErrorResponse::from_body(&body))
}

/// Turn a non-success table API response into a [`QueryError`].
async fn query_error(response: Response) -> QueryError {
    let (status, body) = error_body(response).await;
    tracing::debug!(status, error = ?body, "Table API request failed");

    if status == 404 || body.is_no_rows() {
        QueryError::NotFound
    } else {
        QueryError::Backend(body.describe(status))
    }
}

fn transport_error(e: reqwest::Error) -> QueryError {
    QueryError::Transport(e.to_string())
}

fn url_error(e: url::ParseError) -> QueryError {
    QueryError::Transport(format!("invalid endpoint: {e}"))
}
