mod common;

use common::{comment_draft, policy, post_draft};
use modwatch::domain::transition::{reconcile_comment, reconcile_post};

#[test]
fn first_observation_stamps_first_seen_only() {
    let draft = post_draft("a1", 500);
    let row = reconcile_post(None, &draft, 1_000, policy(0, true));

    assert_eq!(row.first_seen, 1_000);
    assert_eq!(row.removed_at, None);
    assert_eq!(row.locked_at, None);
    assert_eq!(row.last_checked, 1_000);
    assert_eq!(row.series.len(), 1);
}

#[test]
fn removal_timestamp_is_stamped_once_and_survives_unremoval() {
    let live = post_draft("a1", 500);
    let mut removed = post_draft("a1", 500);
    removed.removed_by_category = Some("moderator".to_string());

    let pass1 = reconcile_post(None, &live, 1_000, policy(0, true));
    assert_eq!(pass1.removed_at, None);

    let pass2 = reconcile_post(Some(&pass1), &removed, 2_000, policy(0, true));
    assert_eq!(pass2.removed_at, Some(2_000));
    assert_eq!(pass2.first_seen, 1_000);
    assert_eq!(pass2.removed_by_category.as_deref(), Some("moderator"));

    // Unremoved later: the current flag clears, the timestamp does not.
    let pass3 = reconcile_post(Some(&pass2), &live, 3_000, policy(0, true));
    assert_eq!(pass3.removed_at, Some(2_000));
    assert_eq!(pass3.removed_by_category, None);

    // Removed again: the original timestamp still wins.
    let pass4 = reconcile_post(Some(&pass3), &removed, 4_000, policy(0, true));
    assert_eq!(pass4.removed_at, Some(2_000));
}

#[test]
fn lock_timestamp_follows_the_same_rule() {
    let unlocked = post_draft("a1", 500);
    let mut locked = post_draft("a1", 500);
    locked.locked = true;

    let pass1 = reconcile_post(None, &unlocked, 1_000, policy(0, true));
    let pass2 = reconcile_post(Some(&pass1), &locked, 2_000, policy(0, true));
    let pass3 = reconcile_post(Some(&pass2), &unlocked, 3_000, policy(0, true));

    assert_eq!(pass1.locked_at, None);
    assert_eq!(pass2.locked_at, Some(2_000));
    assert_eq!(pass3.locked_at, Some(2_000));
    assert!(!pass3.locked);
}

#[test]
fn item_removed_on_first_ever_observation_is_stamped_immediately() {
    let mut removed = post_draft("a1", 500);
    removed.removed_by_category = Some("automod_filtered".to_string());

    let row = reconcile_post(None, &removed, 1_000, policy(0, true));
    assert_eq!(row.first_seen, 1_000);
    assert_eq!(row.removed_at, Some(1_000));
}

#[test]
fn reapplying_the_same_observation_changes_nothing() {
    let mut removed = post_draft("a1", 500);
    removed.removed_by_category = Some("moderator".to_string());

    let pass1 = reconcile_post(None, &post_draft("a1", 500), 1_000, policy(0, true));
    let pass2 = reconcile_post(Some(&pass1), &removed, 2_000, policy(0, true));

    // Same draft, later wall clock: transitions and series are unchanged,
    // only last_checked moves.
    let pass3 = reconcile_post(Some(&pass2), &removed, 3_000, policy(0, true));
    assert_eq!(pass3.first_seen, pass2.first_seen);
    assert_eq!(pass3.removed_at, pass2.removed_at);
    assert_eq!(pass3.locked_at, pass2.locked_at);
    assert_eq!(pass3.series, pass2.series);
    assert_eq!(pass3.last_checked, 3_000);
}

#[test]
fn mutable_fields_are_last_write_wins() {
    let mut first = post_draft("a1", 500);
    first.score = 10;
    first.flair = Some("News".to_string());

    let mut second = post_draft("a1", 500);
    second.score = 3;
    second.flair = None;
    second.title = "Edited title".to_string();

    let pass1 = reconcile_post(None, &first, 1_000, policy(0, false));
    let pass2 = reconcile_post(Some(&pass1), &second, 2_000, policy(0, false));

    assert_eq!(pass2.score, 3);
    assert_eq!(pass2.flair, None);
    assert_eq!(pass2.title, "Edited title");
    assert_eq!(pass2.series.len(), 2);
}

#[test]
fn comment_without_bump_keeps_series_untouched() {
    let draft = comment_draft("c1", "a1", 5);

    let pass1 = reconcile_comment(None, &draft, 1_000, policy(0, true), true);
    assert_eq!(pass1.series.len(), 1);

    let mut edited = comment_draft("c1", "a1", 9);
    edited.body = "edited".to_string();
    let pass2 = reconcile_comment(Some(&pass1), &edited, 1_010, policy(0, true), false);

    // Fields refresh, the series does not.
    assert_eq!(pass2.score, 9);
    assert_eq!(pass2.body, "edited");
    assert_eq!(pass2.series, pass1.series);
}

#[test]
fn comment_removal_is_monotonic() {
    let live = comment_draft("c1", "a1", 5);
    let mut removed = comment_draft("c1", "a1", 5);
    removed.removed_by_category = Some("moderator".to_string());

    let pass1 = reconcile_comment(None, &live, 1_000, policy(0, true), true);
    let pass2 = reconcile_comment(Some(&pass1), &removed, 2_000, policy(0, true), true);
    let pass3 = reconcile_comment(Some(&pass2), &live, 3_000, policy(0, true), true);

    assert_eq!(pass2.removed_at, Some(2_000));
    assert_eq!(pass3.removed_at, Some(2_000));
    assert_eq!(pass3.first_seen, 1_000);
}
