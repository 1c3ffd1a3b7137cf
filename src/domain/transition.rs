//! Reconciles a stored row with a fresh observation: write-once transition
//! timestamps, last-write-wins for everything else, series appended via the
//! accumulator. Pure functions of the two snapshots plus the current time.
use crate::domain::model::{
    CommentDraft, CommentRecord, CommentSeriesEntry, PostDraft, PostRecord, PostSeriesEntry,
};
use crate::domain::series::{self, SeriesPolicy};

/// Write-once rule for a moderation transition: a timestamp already set is
/// kept forever; otherwise it is stamped `now` exactly when the flag flips
/// from clear to set. A later flip back never clears it.
fn transition_at(prev_at: Option<i64>, was_set: bool, is_set: bool, now: i64) -> Option<i64> {
    match prev_at {
        Some(at) => Some(at),
        None if !was_set && is_set => Some(now),
        None => None,
    }
}

pub fn reconcile_post(
    prev: Option<&PostRecord>,
    draft: &PostDraft,
    now: i64,
    policy: SeriesPolicy,
) -> PostRecord {
    let first_seen = prev.map(|p| p.first_seen).unwrap_or(now);
    let removed_at = transition_at(
        prev.and_then(|p| p.removed_at),
        prev.map(|p| p.removed_by_category.is_some()).unwrap_or(false),
        draft.removed_by_category.is_some(),
        now,
    );
    let locked_at = transition_at(
        prev.and_then(|p| p.locked_at),
        prev.map(|p| p.locked).unwrap_or(false),
        draft.locked,
        now,
    );

    let entry = PostSeriesEntry {
        ts: now,
        score: draft.score,
        upvote_ratio: draft.upvote_ratio,
        num_comments: draft.num_comments,
        locked: draft.locked,
        removed: draft.removed_by_category.is_some(),
    };
    let base: &[PostSeriesEntry] = prev.map(|p| p.series.as_slice()).unwrap_or(&[]);
    let series = series::append(base, entry, policy);

    PostRecord {
        id: draft.id.clone(),
        subreddit: draft.subreddit.clone(),
        title: draft.title.clone(),
        title_norm: draft.title_norm.clone(),
        author: draft.author.clone(),
        distinguished: draft.distinguished.clone(),
        created_utc: draft.created_utc,
        score: draft.score,
        upvote_ratio: draft.upvote_ratio,
        num_comments: draft.num_comments,
        permalink: draft.permalink.clone(),
        url: draft.url.clone(),
        selftext: draft.selftext.clone(),
        domain: draft.domain.clone(),
        flair: draft.flair.clone(),
        is_self: draft.is_self,
        crosspost_parent: draft.crosspost_parent.clone(),
        edited: draft.edited,
        removed_by_category: draft.removed_by_category.clone(),
        locked: draft.locked,
        first_seen,
        removed_at,
        locked_at,
        last_checked: now,
        series,
    }
}

/// `bump` is false when this identifier was already observed earlier in the
/// same run; the previous series is then carried through unchanged.
pub fn reconcile_comment(
    prev: Option<&CommentRecord>,
    draft: &CommentDraft,
    now: i64,
    policy: SeriesPolicy,
    bump: bool,
) -> CommentRecord {
    let first_seen = prev.map(|c| c.first_seen).unwrap_or(now);
    let removed_at = transition_at(
        prev.and_then(|c| c.removed_at),
        prev.map(|c| c.removed_by_category.is_some()).unwrap_or(false),
        draft.removed_by_category.is_some(),
        now,
    );

    let base: &[CommentSeriesEntry] = prev.map(|c| c.series.as_slice()).unwrap_or(&[]);
    let series = if bump {
        series::append(
            base,
            CommentSeriesEntry {
                ts: now,
                score: draft.score,
            },
            policy,
        )
    } else {
        base.to_vec()
    };

    CommentRecord {
        id: draft.id.clone(),
        post_id: draft.post_id.clone(),
        parent_id: draft.parent_id.clone(),
        author: draft.author.clone(),
        body: draft.body.clone(),
        score: draft.score,
        created_utc: draft.created_utc,
        edited: draft.edited,
        removed_by_category: draft.removed_by_category.clone(),
        distinguished: draft.distinguished.clone(),
        is_submitter: draft.is_submitter,
        collapsed_reason: draft.collapsed_reason.clone(),
        first_seen,
        removed_at,
        last_checked: now,
        series,
    }
}
