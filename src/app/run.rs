//! One complete invocation: discovery scan, discovery comments, recheck.
//! Only credential and primary-store failures abort; everything else is
//! contained at its own scope.
use thiserror::Error;
use tracing::info;

use crate::app::comments::{self, RunState};
use crate::app::context::RunContext;
use crate::app::recheck::{self, RecheckOutcome};
use crate::app::scan;
use crate::domain::model::effective_window;
use crate::infra::time::epoch_secs_to_iso;
use crate::ports::{clock::Clock, gateway::Gateway, store::Store};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("primary store error: {0}")]
    Storage(String),
    #[error("interrupted")]
    Interrupted,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub pages: u32,
    pub scanned_posts: usize,
    pub scanned_comments: usize,
    pub recheck_candidates: usize,
    pub recheck_posts: usize,
    pub recheck_comments: usize,
    pub mirror_active: bool,
}

pub async fn run_once<S, M, G, C>(ctx: &RunContext<S, M, G, C>) -> Result<RunSummary, RunError>
where
    S: Store,
    M: Store,
    G: Gateway,
    C: Clock,
{
    let now = ctx.clock.now_epoch_secs().await;
    let window = effective_window(
        ctx.cfg.lookback_days,
        ctx.cfg.start_override,
        ctx.cfg.end_override,
        now,
    );
    info!(
        subreddit = %ctx.cfg.subreddit,
        window_start = %epoch_secs_to_iso(window.start),
        "Run starting"
    );

    let mut run_state = RunState::new();

    let scanned = scan::scan_new_posts(ctx, window).await?;
    let scanned_comments = if ctx.cfg.comments.enabled {
        comments::fetch_for_posts(
            ctx,
            &scanned.post_ids,
            "discovery",
            None,
            ctx.cfg.comments.limit,
            &mut run_state,
        )
        .await?
    } else {
        0
    };

    let rechecked = if ctx.cfg.recheck.enabled {
        recheck::recheck(ctx, window.start, &mut run_state).await?
    } else {
        RecheckOutcome::default()
    };

    Ok(RunSummary {
        pages: scanned.pages,
        scanned_posts: scanned.post_ids.len(),
        scanned_comments,
        recheck_candidates: rechecked.candidates,
        recheck_posts: rechecked.posts,
        recheck_comments: rechecked.comments,
        mirror_active: ctx.mirror.is_some(),
    })
}
