//! Platform API abstraction: newest-listing pages, comment trees, and
//! batched by-identifier lookups, already decoded into normalized drafts.
use thiserror::Error;

use crate::domain::model::{CommentNode, CommentSort, PostDraft};

#[derive(Debug, Error)]
pub enum FetchError {
    /// Credential rejected even after a forced refresh. Fatal to the run.
    #[error("authentication rejected: {0}")]
    Auth(String),
    /// Retry budget exhausted on one call. Recoverable at the call site.
    #[error("retries exhausted for {url}: {last}")]
    Exhausted { url: String, last: String },
    /// Response arrived but did not decode into the expected shape.
    #[error("could not decode response from {url}: {detail}")]
    Decode { url: String, detail: String },
}

/// One page of the newest-first listing plus the opaque forward cursor.
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub posts: Vec<PostDraft>,
    pub after: Option<String>,
}

#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    async fn newest_page(
        &self,
        subreddit: &str,
        after: Option<&str>,
        limit: u32,
    ) -> Result<ListingPage, FetchError>;

    async fn comment_tree(
        &self,
        subreddit: &str,
        post_id: &str,
        sort: CommentSort,
        limit: u32,
    ) -> Result<Vec<CommentNode>, FetchError>;

    /// Batched lookup; the implementation bounds one call to at most
    /// `LOOKUP_BATCH` identifiers, callers chunk accordingly.
    async fn posts_by_id(&self, ids: &[String]) -> Result<Vec<PostDraft>, FetchError>;
}

/// Upper bound on identifiers per `posts_by_id` call.
pub const LOOKUP_BATCH: usize = 100;
