//! Decodes the platform's JSON envelopes (listings, comment trees, batched
//! lookups) into normalized drafts. Malformed children are skipped rather
//! than failing the whole page.
use serde_json::Value;

use crate::domain::model::{CommentDraft, CommentNode, PostDraft};
use crate::domain::normalize::{absolute_permalink, host_of, normalize_title};
use crate::ports::gateway::ListingPage;

pub fn decode_listing(v: &Value) -> Result<ListingPage, String> {
    let data = v
        .get("data")
        .ok_or_else(|| "listing envelope missing data".to_string())?;
    let children = data
        .get("children")
        .and_then(Value::as_array)
        .ok_or_else(|| "listing envelope missing children".to_string())?;

    let posts = children
        .iter()
        .filter(|c| kind_of(c) == Some("t3"))
        .filter_map(|c| c.get("data").and_then(post_draft))
        .collect();
    let after = data
        .get("after")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(ListingPage { posts, after })
}

/// The by-identifier lookup returns a listing envelope without a cursor.
pub fn decode_info_posts(v: &Value) -> Result<Vec<PostDraft>, String> {
    decode_listing(v).map(|page| page.posts)
}

/// The comment endpoint answers with a two-element array: the parent post's
/// listing, then the comment forest.
pub fn decode_comment_payload(v: &Value) -> Result<Vec<CommentNode>, String> {
    let listings = v
        .as_array()
        .ok_or_else(|| "comment payload is not an array".to_string())?;
    let forest = listings
        .get(1)
        .ok_or_else(|| "comment payload missing comment listing".to_string())?;
    let children = forest
        .get("data")
        .and_then(|d| d.get("children"))
        .and_then(Value::as_array)
        .ok_or_else(|| "comment listing missing children".to_string())?;

    Ok(decode_comment_children(children))
}

fn decode_comment_children(children: &[Value]) -> Vec<CommentNode> {
    children
        .iter()
        .filter(|c| kind_of(c) == Some("t1"))
        .filter_map(|c| c.get("data").and_then(comment_node))
        .collect()
}

fn post_draft(data: &Value) -> Option<PostDraft> {
    let id = opt_str(data, "id")?;
    let subreddit = opt_str(data, "subreddit").unwrap_or_default();
    let title = data
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let is_self = bool_field(data, "is_self");

    // Outbound link only for link posts; self posts point back at themselves.
    let url = if is_self { None } else { opt_str(data, "url") };
    let domain = url.as_deref().and_then(host_of);
    let permalink = match opt_str(data, "permalink") {
        Some(path) => absolute_permalink(&path),
        None => format!("https://www.reddit.com/r/{subreddit}/comments/{id}/"),
    };

    Some(PostDraft {
        title_norm: normalize_title(&title),
        id,
        subreddit,
        title,
        author: opt_str(data, "author").unwrap_or_default(),
        distinguished: opt_str(data, "distinguished"),
        created_utc: epoch_field(data, "created_utc"),
        score: int_field(data, "score"),
        upvote_ratio: data.get("upvote_ratio").and_then(Value::as_f64),
        num_comments: int_field(data, "num_comments"),
        permalink,
        url,
        selftext: opt_str(data, "selftext"),
        domain,
        flair: opt_str(data, "link_flair_text"),
        is_self,
        crosspost_parent: opt_str(data, "crosspost_parent"),
        edited: edited_field(data),
        removed_by_category: opt_str(data, "removed_by_category"),
        locked: bool_field(data, "locked"),
    })
}

fn comment_node(data: &Value) -> Option<CommentNode> {
    let id = opt_str(data, "id")?;
    let post_id = opt_str(data, "link_id")
        .map(|l| l.strip_prefix("t3_").map(str::to_string).unwrap_or(l))
        .unwrap_or_default();

    let draft = CommentDraft {
        id,
        post_id,
        parent_id: opt_str(data, "parent_id").unwrap_or_default(),
        author: opt_str(data, "author").unwrap_or_default(),
        body: data
            .get("body")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        score: int_field(data, "score"),
        created_utc: epoch_field(data, "created_utc"),
        edited: edited_field(data),
        removed_by_category: opt_str(data, "removed_by_category"),
        distinguished: opt_str(data, "distinguished"),
        is_submitter: bool_field(data, "is_submitter"),
        collapsed_reason: opt_str(data, "collapsed_reason"),
    };

    // Leaf comments carry `replies: ""` instead of a nested listing.
    let replies = data
        .get("replies")
        .and_then(|r| r.get("data"))
        .and_then(|d| d.get("children"))
        .and_then(Value::as_array)
        .map(|c| decode_comment_children(c))
        .unwrap_or_default();

    Some(CommentNode { draft, replies })
}

fn kind_of(child: &Value) -> Option<&str> {
    child.get("kind").and_then(Value::as_str)
}

fn opt_str(data: &Value, key: &str) -> Option<String> {
    data.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn int_field(data: &Value, key: &str) -> i64 {
    data.get(key)
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .unwrap_or(0)
}

/// Creation times arrive as floats of epoch seconds.
fn epoch_field(data: &Value, key: &str) -> i64 {
    data.get(key)
        .and_then(|v| v.as_f64().map(|f| f as i64).or_else(|| v.as_i64()))
        .unwrap_or(0)
}

fn bool_field(data: &Value, key: &str) -> bool {
    data.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// `edited` is `false` for untouched content and an epoch float otherwise.
fn edited_field(data: &Value) -> Option<i64> {
    data.get("edited").and_then(|v| v.as_f64()).map(|f| f as i64)
}
