//! Row persistence abstraction, implemented by the SQLite primary and the
//! Postgres mirror alike. Errors are plain strings; the sink decides which
//! side is fatal.
use crate::domain::model::{CommentRecord, PostRecord};

#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn migrate(&self) -> Result<(), String>;

    async fn get_post(&self, id: &str) -> Result<Option<PostRecord>, String>;
    async fn upsert_post(&self, row: &PostRecord) -> Result<(), String>;

    async fn get_comment(&self, id: &str) -> Result<Option<CommentRecord>, String>;
    async fn upsert_comment(&self, row: &CommentRecord) -> Result<(), String>;

    /// Identifiers of posts created at or after the given instant, the
    /// recheck candidate source.
    async fn post_ids_since(&self, created_utc: i64) -> Result<Vec<String>, String>;

    async fn close(&self) {}
}
