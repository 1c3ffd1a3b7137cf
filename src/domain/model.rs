//! Core records, drafts, and configuration shared across scan, recheck, and persistence.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::series::SeriesPolicy;

/// Sort orders the comment-tree endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentSort {
    Confidence,
    New,
}

impl CommentSort {
    pub fn as_param(&self) -> &'static str {
        match self {
            CommentSort::Confidence => "confidence",
            CommentSort::New => "new",
        }
    }
}

/// One metric snapshot of a post. Structural, not a delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSeriesEntry {
    pub ts: i64,
    pub score: i64,
    pub upvote_ratio: Option<f64>,
    pub num_comments: i64,
    pub locked: bool,
    pub removed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentSeriesEntry {
    pub ts: i64,
    pub score: i64,
}

/// A freshly fetched, normalized observation of a post. Carries no
/// transition timestamps; those are owned by the stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub id: String,
    pub subreddit: String,
    pub title: String,
    pub title_norm: String,
    pub author: String,
    pub distinguished: Option<String>,
    pub created_utc: i64,
    pub score: i64,
    pub upvote_ratio: Option<f64>,
    pub num_comments: i64,
    pub permalink: String,
    pub url: Option<String>,
    pub selftext: Option<String>,
    pub domain: Option<String>,
    pub flair: Option<String>,
    pub is_self: bool,
    pub crosspost_parent: Option<String>,
    pub edited: Option<i64>,
    pub removed_by_category: Option<String>,
    pub locked: bool,
}

/// The persisted shape of a post: the latest observation plus the
/// write-once transition timestamps and the bounded series.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub id: String,
    pub subreddit: String,
    pub title: String,
    pub title_norm: String,
    pub author: String,
    pub distinguished: Option<String>,
    pub created_utc: i64,
    pub score: i64,
    pub upvote_ratio: Option<f64>,
    pub num_comments: i64,
    pub permalink: String,
    pub url: Option<String>,
    pub selftext: Option<String>,
    pub domain: Option<String>,
    pub flair: Option<String>,
    pub is_self: bool,
    pub crosspost_parent: Option<String>,
    pub edited: Option<i64>,
    pub removed_by_category: Option<String>,
    pub locked: bool,
    pub first_seen: i64,
    pub removed_at: Option<i64>,
    pub locked_at: Option<i64>,
    pub last_checked: i64,
    pub series: Vec<PostSeriesEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentDraft {
    pub id: String,
    pub post_id: String,
    pub parent_id: String,
    pub author: String,
    pub body: String,
    pub score: i64,
    pub created_utc: i64,
    pub edited: Option<i64>,
    pub removed_by_category: Option<String>,
    pub distinguished: Option<String>,
    pub is_submitter: bool,
    pub collapsed_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentRecord {
    pub id: String,
    pub post_id: String,
    pub parent_id: String,
    pub author: String,
    pub body: String,
    pub score: i64,
    pub created_utc: i64,
    pub edited: Option<i64>,
    pub removed_by_category: Option<String>,
    pub distinguished: Option<String>,
    pub is_submitter: bool,
    pub collapsed_reason: Option<String>,
    pub first_seen: i64,
    pub removed_at: Option<i64>,
    pub last_checked: i64,
    pub series: Vec<CommentSeriesEntry>,
}

/// One node of a fetched comment tree, before flattening.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub draft: CommentDraft,
    pub replies: Vec<CommentNode>,
}

/// Inclusive creation-time range a scan or recheck considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    pub start: i64,
    pub end: i64,
}

/// Window arithmetic: the start never reaches further back than the lookback
/// allows, and an explicit end override narrows the newest edge. An inverted
/// window (`end < start`) is a valid no-op, not an error.
pub fn effective_window(
    lookback_days: u32,
    start_override: Option<i64>,
    end_override: Option<i64>,
    now: i64,
) -> ScanWindow {
    let lookback_start = now - i64::from(lookback_days) * 86_400;
    let start = match start_override {
        Some(s) => s.max(lookback_start),
        None => lookback_start,
    };
    let end = end_override.unwrap_or(i64::MAX);
    ScanWindow { start, end }
}

#[derive(Debug, Clone)]
pub struct CommentConfig {
    pub enabled: bool,
    pub recheck_enabled: bool,
    pub limit: u32,
    pub recheck_limit: u32,
    pub concurrency: usize,
}

#[derive(Debug, Clone)]
pub struct RecheckConfig {
    pub enabled: bool,
    pub max_posts: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub max_attempts: u32,
    pub user_agent: String,
    pub api_base: String,
    pub auth_base: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub subreddit: String,
    pub lookback_days: u32,
    pub start_override: Option<i64>,
    pub end_override: Option<i64>,
    pub page_size: u32,
    pub max_pages: u32,
    pub max_posts: usize,
    pub comments: CommentConfig,
    pub recheck: RecheckConfig,
    pub post_series: SeriesPolicy,
    pub comment_series: SeriesPolicy,
    pub http: HttpConfig,
    pub auth: AuthConfig,
    pub sqlite_path: PathBuf,
    pub postgres_url: Option<String>,
    pub log_level: String,
}
