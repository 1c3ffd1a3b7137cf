//! Storage sink: read the previous row from the primary, reconcile, upsert
//! the primary synchronously, then mirror best-effort. A mirror failure is
//! logged with the row identifier and swallowed; only a primary failure
//! reaches the caller.
use tracing::warn;

use crate::domain::model::{CommentDraft, CommentRecord, PostDraft, PostRecord};
use crate::domain::series::SeriesPolicy;
use crate::domain::transition;
use crate::ports::store::Store;

pub async fn persist_post<S, M>(
    primary: &S,
    mirror: Option<&M>,
    draft: &PostDraft,
    now: i64,
    policy: SeriesPolicy,
) -> Result<PostRecord, String>
where
    S: Store,
    M: Store,
{
    let prev = primary.get_post(&draft.id).await?;
    let row = transition::reconcile_post(prev.as_ref(), draft, now, policy);
    primary.upsert_post(&row).await?;

    if let Some(m) = mirror {
        if let Err(e) = m.upsert_post(&row).await {
            warn!(post_id = %row.id, error = %e, "Mirror post upsert failed");
        }
    }
    Ok(row)
}

/// `bump` is false when this comment was already observed earlier in the
/// same run; the stored series then passes through unchanged.
pub async fn persist_comment<S, M>(
    primary: &S,
    mirror: Option<&M>,
    draft: &CommentDraft,
    now: i64,
    policy: SeriesPolicy,
    bump: bool,
) -> Result<CommentRecord, String>
where
    S: Store,
    M: Store,
{
    let prev = primary.get_comment(&draft.id).await?;
    let row = transition::reconcile_comment(prev.as_ref(), draft, now, policy, bump);
    primary.upsert_comment(&row).await?;

    if let Some(m) = mirror {
        if let Err(e) = m.upsert_comment(&row).await {
            warn!(comment_id = %row.id, error = %e, "Mirror comment upsert failed");
        }
    }
    Ok(row)
}
