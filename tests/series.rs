use modwatch::domain::model::{CommentSeriesEntry, PostSeriesEntry};
use modwatch::domain::retry::{backoff_delay_ms, BACKOFF_CAP_MS, JITTER_SPAN_MS};
use modwatch::domain::series::{append, SeriesPolicy};

fn entry(ts: i64, score: i64) -> PostSeriesEntry {
    PostSeriesEntry {
        ts,
        score,
        upvote_ratio: Some(0.9),
        num_comments: 2,
        locked: false,
        removed: false,
    }
}

fn bounded(max_len: usize) -> SeriesPolicy {
    SeriesPolicy {
        max_len,
        dedup: false,
    }
}

fn dedup(max_len: usize) -> SeriesPolicy {
    SeriesPolicy {
        max_len,
        dedup: true,
    }
}

#[test]
fn series_never_exceeds_the_bound_and_keeps_the_tail() {
    let mut capped: Vec<PostSeriesEntry> = Vec::new();
    let mut unbounded: Vec<PostSeriesEntry> = Vec::new();

    for i in 0..20 {
        capped = append(&capped, entry(i, i), bounded(5));
        unbounded = append(&unbounded, entry(i, i), bounded(0));
    }

    assert_eq!(capped.len(), 5);
    assert_eq!(unbounded.len(), 20);
    assert_eq!(capped.as_slice(), &unbounded[15..]);
}

#[test]
fn zero_max_len_means_unbounded() {
    let mut series: Vec<PostSeriesEntry> = Vec::new();
    for i in 0..200 {
        series = append(&series, entry(i, i), bounded(0));
    }
    assert_eq!(series.len(), 200);
}

#[test]
fn duplicate_sample_is_dropped_when_dedup_is_on() {
    let series = append(&[], entry(1, 7), dedup(0));
    let after_dup = append(&series, entry(2, 7), dedup(0));
    let after_change = append(&after_dup, entry(3, 8), dedup(0));

    // The duplicate differs only in timestamp, so it collapses; the changed
    // score appends exactly one entry.
    assert_eq!(after_dup.len(), 1);
    assert_eq!(after_dup[0].ts, 1);
    assert_eq!(after_change.len(), 2);
}

#[test]
fn dedup_treats_missing_ratio_as_equal_to_missing() {
    let mut a = entry(1, 5);
    a.upvote_ratio = None;
    let mut b = entry(2, 5);
    b.upvote_ratio = None;

    let series = append(&[], a, dedup(0));
    let series = append(&series, b, dedup(0));
    assert_eq!(series.len(), 1);
}

#[test]
fn dedup_off_appends_identical_samples() {
    let series = append(&[], entry(1, 7), bounded(0));
    let series = append(&series, entry(2, 7), bounded(0));
    assert_eq!(series.len(), 2);
}

#[test]
fn append_is_deterministic() {
    let base = vec![entry(1, 1), entry(2, 2)];
    let a = append(&base, entry(3, 3), dedup(2));
    let b = append(&base, entry(3, 3), dedup(2));
    assert_eq!(a, b);
}

#[test]
fn comment_entries_dedup_on_score() {
    let series = append(&[], CommentSeriesEntry { ts: 1, score: 4 }, dedup(0));
    let series = append(&series, CommentSeriesEntry { ts: 2, score: 4 }, dedup(0));
    let series = append(&series, CommentSeriesEntry { ts: 3, score: 5 }, dedup(0));
    assert_eq!(series.len(), 2);
}

#[test]
fn backoff_doubles_then_caps() {
    assert_eq!(backoff_delay_ms(0, 0.0), 500);
    assert_eq!(backoff_delay_ms(1, 0.0), 1_000);
    assert_eq!(backoff_delay_ms(2, 0.0), 2_000);
    assert_eq!(backoff_delay_ms(10, 0.0), BACKOFF_CAP_MS);
}

#[test]
fn backoff_jitter_stays_within_its_span() {
    for attempt in 0..8 {
        let lo = backoff_delay_ms(attempt, 0.0);
        let hi = backoff_delay_ms(attempt, 1.0);
        assert!(hi >= lo);
        assert!(hi - lo <= JITTER_SPAN_MS as u64);
    }
}
