//! Loads the TOML configuration file and normalizes it into `AppConfig`.
//! Secrets may be supplied or overridden through environment variables so
//! the file itself can stay checked in.
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::fs;

use crate::domain::model::{
    AppConfig, AuthConfig, CommentConfig, HttpConfig, RecheckConfig,
};
use crate::domain::retry::DEFAULT_MAX_ATTEMPTS;
use crate::domain::series::SeriesPolicy;

pub const ENV_CLIENT_ID: &str = "MODWATCH_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "MODWATCH_CLIENT_SECRET";
pub const ENV_REFRESH_TOKEN: &str = "MODWATCH_REFRESH_TOKEN";
pub const ENV_POSTGRES_URL: &str = "MODWATCH_POSTGRES_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct RawAppFile {
    app: RawApp,
    scan: RawScan,
    #[serde(default)]
    comments: RawComments,
    #[serde(default)]
    recheck: RawRecheck,
    #[serde(default)]
    series: RawSeries,
    http: RawHttp,
    #[serde(default)]
    auth: RawAuth,
    #[serde(default)]
    sqlite: RawSqlite,
    #[serde(default)]
    postgres: Option<RawPostgres>,
    #[serde(default)]
    logging: RawLogging,
}

#[derive(Debug, Deserialize)]
struct RawApp {
    subreddit: String,
    #[serde(default = "default_lookback_days")]
    lookback_days: u32,
    start_epoch: Option<i64>,
    end_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawScan {
    #[serde(default = "default_page_size")]
    page_size: u32,
    #[serde(default = "default_max_pages")]
    max_pages: u32,
    #[serde(default = "default_max_posts")]
    max_posts: usize,
}

#[derive(Debug, Deserialize)]
struct RawComments {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_true")]
    recheck_enabled: bool,
    #[serde(default = "default_comment_limit")]
    limit: u32,
    #[serde(default = "default_comment_limit")]
    recheck_limit: u32,
    #[serde(default = "default_concurrency")]
    concurrency: usize,
}

// An omitted [comments] section means "all defaults", so Default must agree
// with the per-field serde defaults.
impl Default for RawComments {
    fn default() -> Self {
        Self {
            enabled: true,
            recheck_enabled: true,
            limit: default_comment_limit(),
            recheck_limit: default_comment_limit(),
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRecheck {
    #[serde(default = "default_true")]
    enabled: bool,
    max_posts: Option<usize>,
}

impl Default for RawRecheck {
    fn default() -> Self {
        Self {
            enabled: true,
            max_posts: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    #[serde(default = "default_post_series_len")]
    post_max_len: usize,
    #[serde(default = "default_comment_series_len")]
    comment_max_len: usize,
    #[serde(default = "default_true")]
    post_dedup: bool,
    #[serde(default = "default_true")]
    comment_dedup: bool,
}

impl Default for RawSeries {
    fn default() -> Self {
        Self {
            post_max_len: default_post_series_len(),
            comment_max_len: default_comment_series_len(),
            post_dedup: true,
            comment_dedup: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawHttp {
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,
    user_agent: String,
    #[serde(default = "default_api_base")]
    api_base: String,
    #[serde(default = "default_auth_base")]
    auth_base: String,
}

#[derive(Debug, Deserialize, Default)]
struct RawAuth {
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
    #[serde(default)]
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct RawSqlite {
    #[serde(default = "default_sqlite_path")]
    path: String,
}

impl Default for RawSqlite {
    fn default() -> Self {
        Self {
            path: default_sqlite_path(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawPostgres {
    url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawLogging {
    level: Option<String>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub async fn load(config_path: &Path) -> Result<AppConfig, ConfigError> {
        let content = fs::read_to_string(config_path).await?;
        let raw: RawAppFile = toml::from_str(&content)?;

        let subreddit = raw.app.subreddit.trim().to_string();
        if subreddit.is_empty() {
            return Err(ConfigError::Invalid("app.subreddit cannot be empty".into()));
        }
        if raw.scan.page_size == 0 {
            return Err(ConfigError::Invalid("scan.page_size must be positive".into()));
        }
        if raw.comments.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "comments.concurrency must be positive".into(),
            ));
        }
        if raw.http.max_attempts == 0 {
            return Err(ConfigError::Invalid("http.max_attempts must be positive".into()));
        }
        let user_agent = raw.http.user_agent.trim().to_string();
        if user_agent.is_empty() {
            return Err(ConfigError::Invalid("http.user_agent cannot be empty".into()));
        }

        let auth = AuthConfig {
            client_id: env_or(ENV_CLIENT_ID, raw.auth.client_id),
            client_secret: env_or(ENV_CLIENT_SECRET, raw.auth.client_secret),
            refresh_token: env_or(ENV_REFRESH_TOKEN, raw.auth.refresh_token),
        };
        if auth.client_id.is_empty() || auth.refresh_token.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "auth.client_id and auth.refresh_token are required \
                 (file [auth] section or {ENV_CLIENT_ID}/{ENV_REFRESH_TOKEN})"
            )));
        }

        let postgres_url = std::env::var(ENV_POSTGRES_URL)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| raw.postgres.and_then(|p| p.url))
            .filter(|s| !s.trim().is_empty());

        let log_level = raw
            .logging
            .level
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());

        let sqlite_path = resolve_db_path(config_path, &raw.sqlite.path);

        Ok(AppConfig {
            subreddit,
            lookback_days: raw.app.lookback_days,
            start_override: raw.app.start_epoch,
            end_override: raw.app.end_epoch,
            page_size: raw.scan.page_size.min(100),
            max_pages: raw.scan.max_pages,
            max_posts: raw.scan.max_posts,
            comments: CommentConfig {
                enabled: raw.comments.enabled,
                recheck_enabled: raw.comments.recheck_enabled,
                limit: raw.comments.limit,
                recheck_limit: raw.comments.recheck_limit,
                concurrency: raw.comments.concurrency,
            },
            recheck: RecheckConfig {
                enabled: raw.recheck.enabled,
                max_posts: raw.recheck.max_posts,
            },
            post_series: SeriesPolicy {
                max_len: raw.series.post_max_len,
                dedup: raw.series.post_dedup,
            },
            comment_series: SeriesPolicy {
                max_len: raw.series.comment_max_len,
                dedup: raw.series.comment_dedup,
            },
            http: HttpConfig {
                timeout_seconds: raw.http.timeout_seconds,
                max_attempts: raw.http.max_attempts,
                user_agent,
                api_base: trim_trailing_slash(&raw.http.api_base),
                auth_base: trim_trailing_slash(&raw.http.auth_base),
            },
            auth,
            sqlite_path,
            postgres_url,
            log_level,
        })
    }
}

fn env_or(key: &str, fallback: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(fallback)
        .trim()
        .to_string()
}

fn trim_trailing_slash(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

fn resolve_db_path(config_path: &Path, db_path: &str) -> PathBuf {
    let p = Path::new(db_path);
    if p.is_absolute() {
        return p.to_path_buf();
    }
    config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(p)
}

fn default_lookback_days() -> u32 {
    7
}

fn default_page_size() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    10
}

fn default_max_posts() -> usize {
    1000
}

fn default_comment_limit() -> u32 {
    500
}

fn default_concurrency() -> usize {
    4
}

fn default_post_series_len() -> usize {
    96
}

fn default_comment_series_len() -> usize {
    48
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_api_base() -> String {
    "https://oauth.reddit.com".to_string()
}

fn default_auth_base() -> String {
    "https://www.reddit.com".to_string()
}

fn default_sqlite_path() -> String {
    "modwatch.db".to_string()
}

fn default_true() -> bool {
    true
}
