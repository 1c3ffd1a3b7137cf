//! Best-effort Postgres mirror of the primary schema. Field-for-field the
//! same relations, with the series held as JSONB instead of JSON text.
//! Every error here is advisory; the sink logs and keeps going.
use std::time::Duration;

use sqlx::{
    postgres::PgPoolOptions,
    types::Json,
    PgPool,
};
use tracing::info;

use crate::domain::model::{
    CommentRecord, CommentSeriesEntry, PostRecord, PostSeriesEntry,
};
use crate::ports::store::Store;

pub struct PgMirror {
    pool: PgPool,
}

impl PgMirror {
    pub async fn connect(url: &str) -> Result<Self, String> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(|e| format!("mirror connect error: {e}"))?;
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
    series: Json<Vec<PostSeriesEntry>>,
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
    series: Json<Vec<CommentSeriesEntry>>,
}

#[async_trait::async_trait]
impl Store for PgMirror {
    async fn migrate(&self) -> Result<(), String> {
        info!("Mirror migrate start");

        let ddls = [
            r#"
            CREATE TABLE IF NOT EXISTS posts(
                id TEXT PRIMARY KEY,
                subreddit TEXT NOT NULL,
                title TEXT NOT NULL,
                title_norm TEXT NOT NULL,
                author TEXT NOT NULL,
                distinguished TEXT NULL,
                created_utc BIGINT NOT NULL,
                score BIGINT NOT NULL,
                upvote_ratio DOUBLE PRECISION NULL,
                num_comments BIGINT NOT NULL,
                permalink TEXT NOT NULL,
                url TEXT NULL,
                selftext TEXT NULL,
                domain TEXT NULL,
                flair TEXT NULL,
                is_self BOOLEAN NOT NULL,
                crosspost_parent TEXT NULL,
                edited BIGINT NULL,
                removed_by_category TEXT NULL,
                locked BOOLEAN NOT NULL,
                first_seen BIGINT NOT NULL,
                removed_at BIGINT NULL,
                locked_at BIGINT NULL,
                last_checked BIGINT NOT NULL,
                series JSONB NOT NULL
            )"#,
            r#"
            CREATE TABLE IF NOT EXISTS comments(
                id TEXT PRIMARY KEY,
                post_id TEXT NOT NULL,
                parent_id TEXT NOT NULL,
                author TEXT NOT NULL,
                body TEXT NOT NULL,
                score BIGINT NOT NULL,
                created_utc BIGINT NOT NULL,
                edited BIGINT NULL,
                removed_by_category TEXT NULL,
                distinguished TEXT NULL,
                is_submitter BOOLEAN NOT NULL,
                collapsed_reason TEXT NULL,
                first_seen BIGINT NOT NULL,
                removed_at BIGINT NULL,
                last_checked BIGINT NOT NULL,
                series JSONB NOT NULL
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
                .map_err(|e| format!("mirror migrate error (ddl): {e}"))?;
        }

        info!("Mirror migrate done");
        Ok(())
    }

    async fn get_post(&self, id: &str) -> Result<Option<PostRecord>, String> {
        let row = sqlx::query_as::<_, PostRow>(r#"SELECT * FROM posts WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| format!("mirror get_post error: {e}"))?;
        Ok(row.map(|r| PostRecord {
            id: r.id,
            subreddit: r.subreddit,
            title: r.title,
            title_norm: r.title_norm,
            author: r.author,
            distinguished: r.distinguished,
            created_utc: r.created_utc,
            score: r.score,
            upvote_ratio: r.upvote_ratio,
            num_comments: r.num_comments,
            permalink: r.permalink,
            url: r.url,
            selftext: r.selftext,
            domain: r.domain,
            flair: r.flair,
            is_self: r.is_self,
            crosspost_parent: r.crosspost_parent,
            edited: r.edited,
            removed_by_category: r.removed_by_category,
            locked: r.locked,
            first_seen: r.first_seen,
            removed_at: r.removed_at,
            locked_at: r.locked_at,
            last_checked: r.last_checked,
            series: r.series.0,
        }))
    }

    async fn upsert_post(&self, row: &PostRecord) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO posts(
                id, subreddit, title, title_norm, author, distinguished,
                created_utc, score, upvote_ratio, num_comments, permalink,
                url, selftext, domain, flair, is_self, crosspost_parent,
                edited, removed_by_category, locked,
                first_seen, removed_at, locked_at, last_checked, series
            ) VALUES (
                $1, $2, $3, $4, $5, $6,
                $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17,
                $18, $19, $20,
                $21, $22, $23, $24, $25
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
        .bind(Json(&row.series))
        .execute(&self.pool)
        .await
        .map_err(|e| format!("mirror upsert_post error: {e}"))?;
        Ok(())
    }

    async fn get_comment(&self, id: &str) -> Result<Option<CommentRecord>, String> {
        let row = sqlx::query_as::<_, CommentRow>(r#"SELECT * FROM comments WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| format!("mirror get_comment error: {e}"))?;
        Ok(row.map(|r| CommentRecord {
            id: r.id,
            post_id: r.post_id,
            parent_id: r.parent_id,
            author: r.author,
            body: r.body,
            score: r.score,
            created_utc: r.created_utc,
            edited: r.edited,
            removed_by_category: r.removed_by_category,
            distinguished: r.distinguished,
            is_submitter: r.is_submitter,
            collapsed_reason: r.collapsed_reason,
            first_seen: r.first_seen,
            removed_at: r.removed_at,
            last_checked: r.last_checked,
            series: r.series.0,
        }))
    }

    async fn upsert_comment(&self, row: &CommentRecord) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO comments(
                id, post_id, parent_id, author, body, score, created_utc,
                edited, removed_by_category, distinguished, is_submitter,
                collapsed_reason, first_seen, removed_at, last_checked, series
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7,
                $8, $9, $10, $11,
                $12, $13, $14, $15, $16
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
        .bind(Json(&row.series))
        .execute(&self.pool)
        .await
        .map_err(|e| format!("mirror upsert_comment error: {e}"))?;
        Ok(())
    }

    async fn post_ids_since(&self, created_utc: i64) -> Result<Vec<String>, String> {
        sqlx::query_scalar::<_, String>(
            r#"SELECT id FROM posts WHERE created_utc >= $1 ORDER BY created_utc DESC"#,
        )
        .bind(created_utc)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("mirror post_ids_since error: {e}"))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
