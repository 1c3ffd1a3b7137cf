//! Bounded, optionally-deduplicating append-only series of metric snapshots.
use crate::domain::model::{CommentSeriesEntry, PostSeriesEntry};

/// Length bound and dedup toggle for one series kind. `max_len == 0` means
/// unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesPolicy {
    pub max_len: usize,
    pub dedup: bool,
}

/// Equality on the dedup key set: every field except the timestamp.
pub trait SeriesSample {
    fn same_sample(&self, last: &Self) -> bool;
}

impl SeriesSample for PostSeriesEntry {
    fn same_sample(&self, last: &Self) -> bool {
        self.score == last.score
            && self.upvote_ratio == last.upvote_ratio
            && self.num_comments == last.num_comments
            && self.locked == last.locked
            && self.removed == last.removed
    }
}

impl SeriesSample for CommentSeriesEntry {
    fn same_sample(&self, last: &Self) -> bool {
        self.score == last.score
    }
}

/// Appends `entry` to `prev`, dropping it when dedup is on and it matches the
/// last stored sample, and truncating from the front when the bound is
/// exceeded. Pure and deterministic: identical inputs yield identical output.
pub fn append<T>(prev: &[T], entry: T, policy: SeriesPolicy) -> Vec<T>
where
    T: SeriesSample + Clone,
{
    if policy.dedup {
        if let Some(last) = prev.last() {
            if entry.same_sample(last) {
                return prev.to_vec();
            }
        }
    }

    let mut out = Vec::with_capacity(prev.len() + 1);
    out.extend_from_slice(prev);
    out.push(entry);

    if policy.max_len > 0 && out.len() > policy.max_len {
        let excess = out.len() - policy.max_len;
        out.drain(..excess);
    }
    out
}
