//! Comment-tree fetch and merge: bounded fan-out over parent posts, trees
//! flattened depth-first and merged across sort orders by identifier, each
//! comment's series bumped at most once per run.
use std::collections::{HashMap, HashSet};

use futures::future::join_all;
use tracing::warn;

use crate::app::context::RunContext;
use crate::app::run::RunError;
use crate::app::sink;
use crate::domain::model::{CommentDraft, CommentNode, CommentSort};
use crate::ports::{clock::Clock, gateway::FetchError, gateway::Gateway, store::Store};

/// Per-run memory of which comment identifiers already received a series
/// entry. Created at run start, dropped at run end; never shared between
/// runs.
#[derive(Debug, Default)]
pub struct RunState {
    bumped: HashSet<String>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True exactly once per identifier per run.
    pub fn first_bump(&mut self, id: &str) -> bool {
        self.bumped.insert(id.to_string())
    }
}

/// Fetches and persists the comment trees for `post_ids`. Posts are handled
/// in chunks of the configured concurrency width; each chunk's fetches run
/// in parallel and the chunk is awaited in full before the next starts.
/// Returns the number of comments persisted. Per-post fetch failures are
/// logged and skipped; only credential or primary-store failures escalate.
pub async fn fetch_for_posts<S, M, G, C>(
    ctx: &RunContext<S, M, G, C>,
    post_ids: &[String],
    phase: &str,
    extra_sort: Option<CommentSort>,
    limit: u32,
    run: &mut RunState,
) -> Result<usize, RunError>
where
    S: Store,
    M: Store,
    G: Gateway,
    C: Clock,
{
    if post_ids.is_empty() {
        return Ok(0);
    }

    let mut sorts = vec![CommentSort::Confidence];
    if let Some(sort) = extra_sort {
        if sort != CommentSort::Confidence {
            sorts.push(sort);
        }
    }

    let width = ctx.cfg.comments.concurrency.max(1);
    let mut total = 0usize;

    for chunk in post_ids.chunks(width) {
        let fetches = chunk
            .iter()
            .map(|id| fetch_merged(&ctx.gateway, &ctx.cfg.subreddit, id, &sorts, limit));
        let results = join_all(fetches).await;

        for (post_id, result) in chunk.iter().zip(results) {
            let drafts = match result {
                Ok(drafts) => drafts,
                Err(FetchError::Auth(e)) => return Err(RunError::Auth(e)),
                Err(e) => {
                    warn!(post_id = %post_id, phase, error = %e, "Comment fetch failed");
                    continue;
                }
            };

            for draft in drafts {
                let now = ctx.clock.now_epoch_secs().await;
                let bump = run.first_bump(&draft.id);
                sink::persist_comment(
                    &ctx.primary,
                    ctx.mirror.as_ref(),
                    &draft,
                    now,
                    ctx.cfg.comment_series,
                    bump,
                )
                .await
                .map_err(RunError::Storage)?;
                total += 1;
            }
        }
    }
    Ok(total)
}

/// Fetches the tree once per sort order and merges by identifier: the
/// identifier set is the union, the last-fetched sort wins field conflicts,
/// discovery order follows first appearance. A failed extra sort degrades
/// to the base tree; a failed base sort fails the post.
async fn fetch_merged<G: Gateway>(
    gateway: &G,
    subreddit: &str,
    post_id: &str,
    sorts: &[CommentSort],
    limit: u32,
) -> Result<Vec<CommentDraft>, FetchError> {
    let mut order: Vec<String> = Vec::new();
    let mut merged: HashMap<String, CommentDraft> = HashMap::new();

    for (i, sort) in sorts.iter().enumerate() {
        let nodes = match gateway.comment_tree(subreddit, post_id, *sort, limit).await {
            Ok(nodes) => nodes,
            Err(e @ FetchError::Auth(_)) => return Err(e),
            Err(e) if i == 0 => return Err(e),
            Err(e) => {
                warn!(post_id, sort = sort.as_param(), error = %e, "Extra sort fetch failed, keeping base tree");
                continue;
            }
        };

        let mut flat = Vec::new();
        flatten(nodes, &mut flat);
        for draft in flat {
            if !merged.contains_key(&draft.id) {
                order.push(draft.id.clone());
            }
            merged.insert(draft.id.clone(), draft);
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|id| merged.remove(&id))
        .collect())
}

/// Depth-first flattening: each comment precedes its replies.
fn flatten(nodes: Vec<CommentNode>, out: &mut Vec<CommentDraft>) {
    for node in nodes {
        out.push(node.draft);
        flatten(node.replies, out);
    }
}
