//! Reqwest-backed `Gateway` with bounded timeout, class-specific retries,
//! exponential backoff with jitter, and a single forced token refresh on
//! authorization failure.
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::model::{AuthConfig, CommentNode, CommentSort, HttpConfig, PostDraft};
use crate::domain::retry::backoff_delay_ms;
use crate::infra::auth::TokenManager;
use crate::infra::wire;
use crate::ports::gateway::{FetchError, Gateway, ListingPage};
use crate::ports::random::RandomSource;

pub struct ApiClient<G: RandomSource> {
    client: reqwest::Client,
    tokens: TokenManager,
    rng: G,
    api_base: String,
    max_attempts: u32,
}

impl<G: RandomSource> ApiClient<G> {
    pub fn new(http: &HttpConfig, auth: AuthConfig, rng: G) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent(http.user_agent.clone())
            .timeout(Duration::from_secs(http.timeout_seconds))
            .pool_idle_timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| format!("http client build error: {e}"))?;
        let tokens = TokenManager::new(client.clone(), auth, &http.auth_base);
        Ok(Self {
            client,
            tokens,
            rng,
            api_base: http.api_base.clone(),
            max_attempts: http.max_attempts,
        })
    }

    /// Authenticated GET with the full retry policy. Transient failures
    /// (timeout, connect, 429, 5xx) burn retry budget; an authorization
    /// rejection gets one forced refresh outside that budget, then turns
    /// fatal.
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let mut auth_retried = false;
        let mut attempt: u32 = 0;

        loop {
            let token = self.tokens.bearer().await?;
            debug!(url, attempt, "API request");

            let transient = match self.client.get(url).bearer_auth(&token).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp.json::<Value>().await.map_err(|e| FetchError::Decode {
                            url: url.to_string(),
                            detail: e.to_string(),
                        });
                    }
                    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                        let body = resp.text().await.unwrap_or_default();
                        if !auth_retried && is_credential_failure(status, &body) {
                            auth_retried = true;
                            warn!(url, status = status.as_u16(), "Token rejected, forcing refresh");
                            self.tokens.force_refresh().await?;
                            continue;
                        }
                        return Err(FetchError::Auth(format!("{status} from {url}")));
                    }
                    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                        format!("http {}", status.as_u16())
                    } else {
                        // Remaining 4xx are not retryable; report them as-is.
                        return Err(FetchError::Exhausted {
                            url: url.to_string(),
                            last: format!("http {}", status.as_u16()),
                        });
                    }
                }
                Err(e) => e.to_string(),
            };

            attempt += 1;
            if attempt >= self.max_attempts {
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    last: transient,
                });
            }
            let delay = backoff_delay_ms(attempt - 1, self.rng.next_f64().await);
            debug!(url, attempt, delay_ms = delay, last = %transient, "Retrying after backoff");
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    fn decode_err(url: &str, detail: String) -> FetchError {
        FetchError::Decode {
            url: url.to_string(),
            detail,
        }
    }
}

/// A 401 is always the token's fault. A 403 only is when the body talks
/// about the grant rather than a genuine permission denial.
fn is_credential_failure(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::UNAUTHORIZED {
        return true;
    }
    let lower = body.to_ascii_lowercase();
    ["invalid_token", "invalid_grant", "expired", "user_required"]
        .iter()
        .any(|marker| lower.contains(marker))
}

#[async_trait::async_trait]
impl<G: RandomSource> Gateway for ApiClient<G> {
    async fn newest_page(
        &self,
        subreddit: &str,
        after: Option<&str>,
        limit: u32,
    ) -> Result<ListingPage, FetchError> {
        let mut url = format!(
            "{}/r/{}/new.json?limit={}&raw_json=1",
            self.api_base, subreddit, limit
        );
        if let Some(cursor) = after {
            url.push_str("&after=");
            url.push_str(cursor);
        }
        let body = self.get_json(&url).await?;
        wire::decode_listing(&body).map_err(|e| Self::decode_err(&url, e))
    }

    async fn comment_tree(
        &self,
        subreddit: &str,
        post_id: &str,
        sort: CommentSort,
        limit: u32,
    ) -> Result<Vec<CommentNode>, FetchError> {
        let url = format!(
            "{}/r/{}/comments/{}.json?sort={}&limit={}&raw_json=1",
            self.api_base,
            subreddit,
            post_id,
            sort.as_param(),
            limit
        );
        let body = self.get_json(&url).await?;
        wire::decode_comment_payload(&body).map_err(|e| Self::decode_err(&url, e))
    }

    async fn posts_by_id(&self, ids: &[String]) -> Result<Vec<PostDraft>, FetchError> {
        let fullnames = ids
            .iter()
            .map(|id| format!("t3_{id}"))
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/api/info.json?id={}&raw_json=1", self.api_base, fullnames);
        let body = self.get_json(&url).await?;
        wire::decode_info_posts(&body).map_err(|e| Self::decode_err(&url, e))
    }
}
