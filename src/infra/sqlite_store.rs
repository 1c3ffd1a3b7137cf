//! SQLite primary store: one row per post/comment identifier, upserts that
//! never regress the write-once transition columns, series serialized as
//! JSON text at this boundary only.
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use tracing::info;

use crate::domain::model::{CommentRecord, PostRecord};
use crate::ports::store::Store;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(db_path: &Path) -> Result<Self, String> {
        let full_path = if db_path.is_absolute() {
            db_path.to_path_buf()
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(db_path)
        };

        if let Some(parent) = full_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| format!("db dir create error: {e}"))?;
        }

        let url = format!("sqlite://{}", full_path.display());
        let opts = SqliteConnectOptions::from_str(&url)
            .map_err(|e| format!("db connect options error: {e}"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| format!("db connect error: {e}"))?;
        Ok(Self { pool })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: String,
    subreddit: String,
    title: String,
    title_norm: String,
    author: String,
    distinguished: Option<String>,
    created_utc: i64,
    score: i64,
    upvote_ratio: Option<f64>,
    num_comments: i64,
    permalink: String,
    url: Option<String>,
    selftext: Option<String>,
    domain: Option<String>,
    flair: Option<String>,
    is_self: bool,
    crosspost_parent: Option<String>,
    edited: Option<i64>,
    removed_by_category: Option<String>,
    locked: bool,
    first_seen: i64,
    removed_at: Option<i64>,
    locked_at: Option<i64>,
    last_checked: i64,
    series: String,
}

impl PostRow {
    fn into_record(self) -> Result<PostRecord, String> {
        let series = serde_json::from_str(&self.series)
            .map_err(|e| format!("post {} series decode error: {e}", self.id))?;
        Ok(PostRecord {
            id: self.id,
            subreddit: self.subreddit,
            title: self.title,
            title_norm: self.title_norm,
            author: self.author,
            distinguished: self.distinguished,
            created_utc: self.created_utc,
            score: self.score,
            upvote_ratio: self.upvote_ratio,
            num_comments: self.num_comments,
            permalink: self.permalink,
            url: self.url,
            selftext: self.selftext,
            domain: self.domain,
            flair: self.flair,
            is_self: self.is_self,
            crosspost_parent: self.crosspost_parent,
            edited: self.edited,
            removed_by_category: self.removed_by_category,
            locked: self.locked,
            first_seen: self.first_seen,
            removed_at: self.removed_at,
            locked_at: self.locked_at,
            last_checked: self.last_checked,
            series,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: String,
    post_id: String,
    parent_id: String,
    author: String,
    body: String,
    score: i64,
    created_utc: i64,
    edited: Option<i64>,
    removed_by_category: Option<String>,
    distinguished: Option<String>,
    is_submitter: bool,
    collapsed_reason: Option<String>,
    first_seen: i64,
    removed_at: Option<i64>,
    last_checked: i64,
    series: String,
}

impl CommentRow {
    fn into_record(self) -> Result<CommentRecord, String> {
        let series = serde_json::from_str(&self.series)
            .map_err(|e| format!("comment {} series decode error: {e}", self.id))?;
        Ok(CommentRecord {
            id: self.id,
            post_id: self.post_id,
            parent_id: self.parent_id,
            author: self.author,
            body: self.body,
            score: self.score,
            created_utc: self.created_utc,
            edited: self.edited,
            removed_by_category: self.removed_by_category,
            distinguished: self.distinguished,
            is_submitter: self.is_submitter,
            collapsed_reason: self.collapsed_reason,
            first_seen: self.first_seen,
            removed_at: self.removed_at,
            last_checked: self.last_checked,
            series,
        })
    }
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    async fn migrate(&self) -> Result<(), String> {
        info!("DB migrate start");

        let ddls = [
            r#"
            CREATE TABLE IF NOT EXISTS posts(
                id TEXT PRIMARY KEY,
                subreddit TEXT NOT NULL,
                title TEXT NOT NULL,
                title_norm TEXT NOT NULL,
                author TEXT NOT NULL,
                distinguished TEXT NULL,
                created_utc INTEGER NOT NULL,
                score INTEGER NOT NULL,
                upvote_ratio REAL NULL,
                num_comments INTEGER NOT NULL,
                permalink TEXT NOT NULL,
                url TEXT NULL,
                selftext TEXT NULL,
                domain TEXT NULL,
                flair TEXT NULL,
                is_self INTEGER NOT NULL,
                crosspost_parent TEXT NULL,
                edited INTEGER NULL,
                removed_by_category TEXT NULL,
                locked INTEGER NOT NULL,
                first_seen INTEGER NOT NULL,
                removed_at INTEGER NULL,
                locked_at INTEGER NULL,
                last_checked INTEGER NOT NULL,
                series TEXT NOT NULL
            )"#,
            r#"
            CREATE TABLE IF NOT EXISTS comments(
                id TEXT PRIMARY KEY,
                post_id TEXT NOT NULL,
                parent_id TEXT NOT NULL,
                author TEXT NOT NULL,
                body TEXT NOT NULL,
                score INTEGER NOT NULL,
                created_utc INTEGER NOT NULL,
                edited INTEGER NULL,
                removed_by_category TEXT NULL,
                distinguished TEXT NULL,
                is_submitter INTEGER NOT NULL,
                collapsed_reason TEXT NULL,
                first_seen INTEGER NOT NULL,
                removed_at INTEGER NULL,
                last_checked INTEGER NOT NULL,
                series TEXT NOT NULL
            )"#,
            r#"CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_utc)"#,
            r#"CREATE INDEX IF NOT EXISTS idx_posts_flair ON posts(flair)"#,
            r#"CREATE INDEX IF NOT EXISTS idx_posts_domain ON posts(domain)"#,
            r#"CREATE INDEX IF NOT EXISTS idx_comments_created ON comments(created_utc)"#,
            r#"CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id)"#,
        ];

        for ddl in ddls {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| format!("migrate error (ddl): {e}"))?;
        }

        info!("DB migrate done");
        Ok(())
    }

    async fn get_post(&self, id: &str) -> Result<Option<PostRecord>, String> {
        let row = sqlx::query_as::<_, PostRow>(r#"SELECT * FROM posts WHERE id = ?1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| format!("get_post error: {e}"))?;
        row.map(PostRow::into_record).transpose()
    }

    async fn upsert_post(&self, row: &PostRecord) -> Result<(), String> {
        let series = serde_json::to_string(&row.series)
            .map_err(|e| format!("post {} series encode error: {e}", row.id))?;
        sqlx::query(
            r#"
            INSERT INTO posts(
                id, subreddit, title, title_norm, author, distinguished,
                created_utc, score, upvote_ratio, num_comments, permalink,
                url, selftext, domain, flair, is_self, crosspost_parent,
                edited, removed_by_category, locked,
                first_seen, removed_at, locked_at, last_checked, series
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16, ?17,
                ?18, ?19, ?20,
                ?21, ?22, ?23, ?24, ?25
            )
            ON CONFLICT(id) DO UPDATE SET
                subreddit = excluded.subreddit,
                title = excluded.title,
                title_norm = excluded.title_norm,
                author = excluded.author,
                distinguished = excluded.distinguished,
                created_utc = excluded.created_utc,
                score = excluded.score,
                upvote_ratio = excluded.upvote_ratio,
                num_comments = excluded.num_comments,
                permalink = excluded.permalink,
                url = excluded.url,
                selftext = excluded.selftext,
                domain = excluded.domain,
                flair = excluded.flair,
                is_self = excluded.is_self,
                crosspost_parent = excluded.crosspost_parent,
                edited = excluded.edited,
                removed_by_category = excluded.removed_by_category,
                locked = excluded.locked,
                first_seen = COALESCE(posts.first_seen, excluded.first_seen),
                removed_at = COALESCE(posts.removed_at, excluded.removed_at),
                locked_at = COALESCE(posts.locked_at, excluded.locked_at),
                last_checked = excluded.last_checked,
                series = excluded.series
            "#,
        )
        .bind(&row.id)
        .bind(&row.subreddit)
        .bind(&row.title)
        .bind(&row.title_norm)
        .bind(&row.author)
        .bind(&row.distinguished)
        .bind(row.created_utc)
        .bind(row.score)
        .bind(row.upvote_ratio)
        .bind(row.num_comments)
        .bind(&row.permalink)
        .bind(&row.url)
        .bind(&row.selftext)
        .bind(&row.domain)
        .bind(&row.flair)
        .bind(row.is_self)
        .bind(&row.crosspost_parent)
        .bind(row.edited)
        .bind(&row.removed_by_category)
        .bind(row.locked)
        .bind(row.first_seen)
        .bind(row.removed_at)
        .bind(row.locked_at)
        .bind(row.last_checked)
        .bind(&series)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("upsert_post error: {e}"))?;
        Ok(())
    }

    async fn get_comment(&self, id: &str) -> Result<Option<CommentRecord>, String> {
        let row = sqlx::query_as::<_, CommentRow>(r#"SELECT * FROM comments WHERE id = ?1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| format!("get_comment error: {e}"))?;
        row.map(CommentRow::into_record).transpose()
    }

    async fn upsert_comment(&self, row: &CommentRecord) -> Result<(), String> {
        let series = serde_json::to_string(&row.series)
            .map_err(|e| format!("comment {} series encode error: {e}", row.id))?;
        sqlx::query(
            r#"
            INSERT INTO comments(
                id, post_id, parent_id, author, body, score, created_utc,
                edited, removed_by_category, distinguished, is_submitter,
                collapsed_reason, first_seen, removed_at, last_checked, series
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16
            )
            ON CONFLICT(id) DO UPDATE SET
                post_id = excluded.post_id,
                parent_id = excluded.parent_id,
                author = excluded.author,
                body = excluded.body,
                score = excluded.score,
                created_utc = excluded.created_utc,
                edited = excluded.edited,
                removed_by_category = excluded.removed_by_category,
                distinguished = excluded.distinguished,
                is_submitter = excluded.is_submitter,
                collapsed_reason = excluded.collapsed_reason,
                first_seen = COALESCE(comments.first_seen, excluded.first_seen),
                removed_at = COALESCE(comments.removed_at, excluded.removed_at),
                last_checked = excluded.last_checked,
                series = excluded.series
            "#,
        )
        .bind(&row.id)
        .bind(&row.post_id)
        .bind(&row.parent_id)
        .bind(&row.author)
        .bind(&row.body)
        .bind(row.score)
        .bind(row.created_utc)
        .bind(row.edited)
        .bind(&row.removed_by_category)
        .bind(&row.distinguished)
        .bind(row.is_submitter)
        .bind(&row.collapsed_reason)
        .bind(row.first_seen)
        .bind(row.removed_at)
        .bind(row.last_checked)
        .bind(&series)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("upsert_comment error: {e}"))?;
        Ok(())
    }

    async fn post_ids_since(&self, created_utc: i64) -> Result<Vec<String>, String> {
        sqlx::query_scalar::<_, String>(
            r#"SELECT id FROM posts WHERE created_utc >= ?1 ORDER BY created_utc DESC"#,
        )
        .bind(created_utc)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("post_ids_since error: {e}"))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
