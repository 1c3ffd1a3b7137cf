//! Forward discovery pass: walks the newest-first listing page by page,
//! honoring the scan window and the page/post caps, and persists every
//! qualifying post before its identifier is handed to the comment fetcher.
use tracing::{info, warn};

use crate::app::context::RunContext;
use crate::app::run::RunError;
use crate::app::sink;
use crate::domain::model::ScanWindow;
use crate::ports::{clock::Clock, gateway::FetchError, gateway::Gateway, store::Store};

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub pages: u32,
    pub post_ids: Vec<String>,
}

pub async fn scan_new_posts<S, M, G, C>(
    ctx: &RunContext<S, M, G, C>,
    window: ScanWindow,
) -> Result<ScanOutcome, RunError>
where
    S: Store,
    M: Store,
    G: Gateway,
    C: Clock,
{
    let mut outcome = ScanOutcome::default();
    if window.end < window.start {
        info!("Scan window is inverted, nothing to discover");
        return Ok(outcome);
    }

    let cfg = &ctx.cfg;
    let mut after: Option<String> = None;

    'paging: while outcome.pages < cfg.max_pages {
        let page = match ctx
            .gateway
            .newest_page(&cfg.subreddit, after.as_deref(), cfg.page_size)
            .await
        {
            Ok(page) => page,
            Err(FetchError::Auth(e)) => return Err(RunError::Auth(e)),
            Err(e) => {
                // Without this page there is no cursor to continue from;
                // recheck and the next scheduled run pick up the slack.
                warn!(page = outcome.pages, error = %e, "Listing page failed, ending scan early");
                break;
            }
        };
        outcome.pages += 1;

        for draft in &page.posts {
            // The feed is newest-first: the first post older than the
            // window start ends the whole scan.
            if draft.created_utc < window.start {
                break 'paging;
            }
            // Newer than the window end does not imply the rest of the
            // page is too; skip and keep walking.
            if draft.created_utc > window.end {
                continue;
            }

            let now = ctx.clock.now_epoch_secs().await;
            sink::persist_post(
                &ctx.primary,
                ctx.mirror.as_ref(),
                draft,
                now,
                cfg.post_series,
            )
            .await
            .map_err(RunError::Storage)?;
            outcome.post_ids.push(draft.id.clone());

            if outcome.post_ids.len() >= cfg.max_posts {
                info!(max_posts = cfg.max_posts, "Post cap reached, ending scan");
                break 'paging;
            }
        }

        after = match page.after {
            Some(cursor) => Some(cursor),
            None => break,
        };
    }

    info!(
        pages = outcome.pages,
        posts = outcome.post_ids.len(),
        "Discovery scan finished"
    );
    Ok(outcome)
}
