#![allow(dead_code)]
//! Shared fixtures: in-memory store, scripted gateway, manual clock, and
//! record builders used across the integration tests.
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use modwatch::app::context::RunContext;
use modwatch::domain::model::{
    AppConfig, AuthConfig, CommentConfig, CommentDraft, CommentNode, CommentRecord, CommentSort,
    HttpConfig, PostDraft, PostRecord, RecheckConfig,
};
use modwatch::domain::series::SeriesPolicy;
use modwatch::domain::transition;
use modwatch::ports::clock::Clock;
use modwatch::ports::gateway::{FetchError, Gateway, ListingPage};
use modwatch::ports::store::Store;

#[derive(Default)]
pub struct MemStore {
    pub posts: Mutex<HashMap<String, PostRecord>>,
    pub comments: Mutex<HashMap<String, CommentRecord>>,
    /// Simulates an unreachable store: every call errors.
    pub offline: bool,
}

impl MemStore {
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn seed_post(&self, row: PostRecord) {
        self.posts.lock().unwrap().insert(row.id.clone(), row);
    }

    pub fn post(&self, id: &str) -> Option<PostRecord> {
        self.posts.lock().unwrap().get(id).cloned()
    }

    pub fn comment(&self, id: &str) -> Option<CommentRecord> {
        self.comments.lock().unwrap().get(id).cloned()
    }

    fn gate(&self) -> Result<(), String> {
        if self.offline {
            Err("store offline".to_string())
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl Store for MemStore {
    async fn migrate(&self) -> Result<(), String> {
        self.gate()
    }

    async fn get_post(&self, id: &str) -> Result<Option<PostRecord>, String> {
        self.gate()?;
        Ok(self.posts.lock().unwrap().get(id).cloned())
    }

    async fn upsert_post(&self, row: &PostRecord) -> Result<(), String> {
        self.gate()?;
        self.posts.lock().unwrap().insert(row.id.clone(), row.clone());
        Ok(())
    }

    async fn get_comment(&self, id: &str) -> Result<Option<CommentRecord>, String> {
        self.gate()?;
        Ok(self.comments.lock().unwrap().get(id).cloned())
    }

    async fn upsert_comment(&self, row: &CommentRecord) -> Result<(), String> {
        self.gate()?;
        self.comments
            .lock()
            .unwrap()
            .insert(row.id.clone(), row.clone());
        Ok(())
    }

    async fn post_ids_since(&self, created_utc: i64) -> Result<Vec<String>, String> {
        self.gate()?;
        let mut ids: Vec<String> = self
            .posts
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.created_utc >= created_utc)
            .map(|p| p.id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

/// Scripted gateway: listing pages served in order, comment trees keyed by
/// (post id, sort), lookups answered from a map.
#[derive(Default)]
pub struct MockGateway {
    pub pages: Vec<ListingPage>,
    pub pages_served: AtomicUsize,
    pub trees: Mutex<HashMap<(String, &'static str), Vec<CommentNode>>>,
    pub lookup: Mutex<HashMap<String, PostDraft>>,
}

impl MockGateway {
    pub fn with_pages(pages: Vec<ListingPage>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn add_tree(&self, post_id: &str, sort: CommentSort, nodes: Vec<CommentNode>) {
        self.trees
            .lock()
            .unwrap()
            .insert((post_id.to_string(), sort.as_param()), nodes);
    }

    pub fn add_lookup(&self, draft: PostDraft) {
        self.lookup.lock().unwrap().insert(draft.id.clone(), draft);
    }

    pub fn served(&self) -> usize {
        self.pages_served.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Gateway for MockGateway {
    async fn newest_page(
        &self,
        _subreddit: &str,
        _after: Option<&str>,
        _limit: u32,
    ) -> Result<ListingPage, FetchError> {
        let idx = self.pages_served.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(idx)
            .cloned()
            .ok_or_else(|| FetchError::Exhausted {
                url: "mock:listing".to_string(),
                last: "no more pages scripted".to_string(),
            })
    }

    async fn comment_tree(
        &self,
        _subreddit: &str,
        post_id: &str,
        sort: CommentSort,
        _limit: u32,
    ) -> Result<Vec<CommentNode>, FetchError> {
        self.trees
            .lock()
            .unwrap()
            .get(&(post_id.to_string(), sort.as_param()))
            .cloned()
            .ok_or_else(|| FetchError::Exhausted {
                url: format!("mock:comments/{post_id}"),
                last: "no tree scripted".to_string(),
            })
    }

    async fn posts_by_id(&self, ids: &[String]) -> Result<Vec<PostDraft>, FetchError> {
        let map = self.lookup.lock().unwrap();
        Ok(ids.iter().filter_map(|id| map.get(id).cloned()).collect())
    }
}

pub struct ManualClock(pub i64);

#[async_trait::async_trait]
impl Clock for ManualClock {
    async fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

pub fn policy(max_len: usize, dedup: bool) -> SeriesPolicy {
    SeriesPolicy { max_len, dedup }
}

pub fn post_draft(id: &str, created_utc: i64) -> PostDraft {
    PostDraft {
        id: id.to_string(),
        subreddit: "testsub".to_string(),
        title: format!("Post {id}"),
        title_norm: format!("post {id}"),
        author: "author".to_string(),
        distinguished: None,
        created_utc,
        score: 1,
        upvote_ratio: Some(1.0),
        num_comments: 0,
        permalink: format!("https://www.reddit.com/r/testsub/comments/{id}/"),
        url: None,
        selftext: Some("body".to_string()),
        domain: None,
        flair: None,
        is_self: true,
        crosspost_parent: None,
        edited: None,
        removed_by_category: None,
        locked: false,
    }
}

/// A stored row as the sink would have produced it at `seen_at`.
pub fn post_record(id: &str, created_utc: i64, seen_at: i64) -> PostRecord {
    transition::reconcile_post(None, &post_draft(id, created_utc), seen_at, policy(0, true))
}

pub fn comment_draft(id: &str, post_id: &str, score: i64) -> CommentDraft {
    CommentDraft {
        id: id.to_string(),
        post_id: post_id.to_string(),
        parent_id: format!("t3_{post_id}"),
        author: "commenter".to_string(),
        body: "a comment".to_string(),
        score,
        created_utc: 1_000,
        edited: None,
        removed_by_category: None,
        distinguished: None,
        is_submitter: false,
        collapsed_reason: None,
    }
}

pub fn leaf(draft: CommentDraft) -> CommentNode {
    CommentNode {
        draft,
        replies: Vec::new(),
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        subreddit: "testsub".to_string(),
        lookback_days: 7,
        start_override: None,
        end_override: None,
        page_size: 100,
        max_pages: 10,
        max_posts: 1000,
        comments: CommentConfig {
            enabled: false,
            recheck_enabled: false,
            limit: 500,
            recheck_limit: 500,
            concurrency: 2,
        },
        recheck: RecheckConfig {
            enabled: false,
            max_posts: None,
        },
        post_series: policy(0, true),
        comment_series: policy(0, true),
        http: HttpConfig {
            timeout_seconds: 5,
            max_attempts: 3,
            user_agent: "modwatch-tests".to_string(),
            api_base: "http://localhost:0".to_string(),
            auth_base: "http://localhost:0".to_string(),
        },
        auth: AuthConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
        },
        sqlite_path: PathBuf::from(":memory:"),
        postgres_url: None,
        log_level: "info".to_string(),
    }
}

pub fn test_ctx(
    cfg: AppConfig,
    primary: MemStore,
    mirror: Option<MemStore>,
    gateway: MockGateway,
    now: i64,
) -> RunContext<MemStore, MemStore, MockGateway, ManualClock> {
    RunContext {
        cfg,
        primary,
        mirror,
        gateway,
        clock: ManualClock(now),
    }
}
