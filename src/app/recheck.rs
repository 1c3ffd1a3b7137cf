//! Backward recheck pass: re-observes every in-window post known to either
//! store, so transitions on items the forward scan no longer reaches are
//! still caught. The candidate set is the union of both stores precisely
//! because a fresh primary file must not hide history the mirror kept.
use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::app::comments::{self, RunState};
use crate::app::context::RunContext;
use crate::app::run::RunError;
use crate::app::sink;
use crate::domain::model::CommentSort;
use crate::ports::{
    clock::Clock,
    gateway::{FetchError, Gateway, LOOKUP_BATCH},
    store::Store,
};

#[derive(Debug, Default)]
pub struct RecheckOutcome {
    pub candidates: usize,
    pub posts: usize,
    pub comments: usize,
}

pub async fn recheck<S, M, G, C>(
    ctx: &RunContext<S, M, G, C>,
    window_start: i64,
    run: &mut RunState,
) -> Result<RecheckOutcome, RunError>
where
    S: Store,
    M: Store,
    G: Gateway,
    C: Clock,
{
    let mut ids: BTreeSet<String> = ctx
        .primary
        .post_ids_since(window_start)
        .await
        .map_err(RunError::Storage)?
        .into_iter()
        .collect();

    if let Some(m) = ctx.mirror.as_ref() {
        match m.post_ids_since(window_start).await {
            Ok(more) => ids.extend(more),
            Err(e) => warn!(error = %e, "Mirror candidate read failed, using primary set only"),
        }
    }

    let mut candidates: Vec<String> = ids.into_iter().collect();
    if let Some(cap) = ctx.cfg.recheck.max_posts {
        candidates.truncate(cap);
    }
    info!(candidates = candidates.len(), window_start, "Recheck candidates gathered");

    let mut refreshed: Vec<String> = Vec::new();
    for batch in candidates.chunks(LOOKUP_BATCH) {
        let drafts = match ctx.gateway.posts_by_id(batch).await {
            Ok(drafts) => drafts,
            Err(FetchError::Auth(e)) => return Err(RunError::Auth(e)),
            Err(e) => {
                warn!(batch_len = batch.len(), error = %e, "Recheck batch failed");
                continue;
            }
        };

        for draft in &drafts {
            let now = ctx.clock.now_epoch_secs().await;
            sink::persist_post(
                &ctx.primary,
                ctx.mirror.as_ref(),
                draft,
                now,
                ctx.cfg.post_series,
            )
            .await
            .map_err(RunError::Storage)?;
            refreshed.push(draft.id.clone());
        }
    }

    let comments = if ctx.cfg.comments.enabled && ctx.cfg.comments.recheck_enabled {
        comments::fetch_for_posts(
            ctx,
            &refreshed,
            "recheck",
            Some(CommentSort::New),
            ctx.cfg.comments.recheck_limit,
            run,
        )
        .await?
    } else {
        0
    };

    Ok(RecheckOutcome {
        candidates: candidates.len(),
        posts: refreshed.len(),
        comments,
    })
}
