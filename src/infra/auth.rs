//! Bearer-token cache over the identity provider's refresh grant. The cache
//! sits behind a single mutex held across the refresh call, so concurrent
//! callers coalesce into one refresh instead of stampeding the endpoint.
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::model::AuthConfig;
use crate::infra::time::now_epoch_secs;
use crate::ports::gateway::FetchError;

/// Refresh this many seconds before the provider-reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 10;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: i64,
}

pub struct TokenManager {
    client: reqwest::Client,
    creds: AuthConfig,
    token_url: String,
    cache: Mutex<Option<CachedToken>>,
}

impl TokenManager {
    pub fn new(client: reqwest::Client, creds: AuthConfig, auth_base: &str) -> Self {
        Self {
            client,
            creds,
            token_url: format!("{auth_base}/api/v1/access_token"),
            cache: Mutex::new(None),
        }
    }

    /// Returns the cached token while the safety margin holds, refreshing
    /// in place otherwise.
    pub async fn bearer(&self) -> Result<String, FetchError> {
        let mut guard = self.cache.lock().await;
        if let Some(cached) = guard.as_ref() {
            if now_epoch_secs() + EXPIRY_MARGIN_SECS < cached.expires_at {
                return Ok(cached.token.clone());
            }
            debug!("Cached token near expiry, refreshing");
        }
        let fresh = self.refresh().await?;
        let token = fresh.token.clone();
        *guard = Some(fresh);
        Ok(token)
    }

    /// Drops the cache and refreshes unconditionally. Used after the API
    /// rejects a request as unauthorized.
    pub async fn force_refresh(&self) -> Result<String, FetchError> {
        let mut guard = self.cache.lock().await;
        let fresh = self.refresh().await?;
        let token = fresh.token.clone();
        *guard = Some(fresh);
        Ok(token)
    }

    async fn refresh(&self) -> Result<CachedToken, FetchError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", self.creds.refresh_token.as_str()),
        ];
        let resp = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.creds.client_id, Some(&self.creds.client_secret))
            .form(&params)
            .send()
            .await
            .map_err(|e| FetchError::Exhausted {
                url: self.token_url.clone(),
                last: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Auth(format!(
                "token endpoint returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let decoded: TokenResponse = resp.json().await.map_err(|e| FetchError::Decode {
            url: self.token_url.clone(),
            detail: e.to_string(),
        })?;
        if decoded.access_token.is_empty() {
            return Err(FetchError::Auth("token endpoint returned an empty token".into()));
        }

        let expires_at = now_epoch_secs() + decoded.expires_in.max(0);
        info!(expires_at, "Obtained access token");
        Ok(CachedToken {
            token: decoded.access_token,
            expires_at,
        })
    }
}
