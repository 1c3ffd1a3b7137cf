mod common;

use common::{post_draft, test_config, test_ctx, MemStore, MockGateway};
use modwatch::app::scan::scan_new_posts;
use modwatch::domain::model::ScanWindow;
use modwatch::ports::gateway::ListingPage;

fn page(ids_and_times: &[(&str, i64)], after: Option<&str>) -> ListingPage {
    ListingPage {
        posts: ids_and_times
            .iter()
            .map(|(id, t)| post_draft(id, *t))
            .collect(),
        after: after.map(str::to_string),
    }
}

#[tokio::test]
async fn pager_stops_at_the_first_post_below_the_window_start() {
    let gateway = MockGateway::with_pages(vec![
        page(&[("a", 1_000), ("b", 900), ("c", 800)], Some("p2")),
        page(&[("d", 700), ("e", 600)], Some("p3")),
        page(&[("f", 500)], None),
    ]);
    let ctx = test_ctx(test_config(), MemStore::default(), None, gateway, 5_000);

    let outcome = scan_new_posts(
        &ctx,
        ScanWindow {
            start: 650,
            end: i64::MAX,
        },
    )
    .await
    .unwrap();

    // Everything at or above the cutoff is discovered; the feed is
    // time-ordered, so the first older post ends paging and the third page
    // is never requested.
    assert_eq!(outcome.post_ids, vec!["a", "b", "c", "d"]);
    assert_eq!(ctx.gateway.served(), 2);
    assert!(ctx.primary.post("d").is_some());
    assert!(ctx.primary.post("e").is_none());
}

#[tokio::test]
async fn posts_newer_than_the_window_end_are_skipped_but_paging_continues() {
    let gateway = MockGateway::with_pages(vec![
        page(&[("a", 1_000), ("b", 900)], Some("p2")),
        page(&[("c", 800), ("d", 600)], None),
    ]);
    let ctx = test_ctx(test_config(), MemStore::default(), None, gateway, 5_000);

    let outcome = scan_new_posts(
        &ctx,
        ScanWindow {
            start: 700,
            end: 950,
        },
    )
    .await
    .unwrap();

    assert_eq!(outcome.post_ids, vec!["b", "c"]);
    assert_eq!(ctx.gateway.served(), 2);
}

#[tokio::test]
async fn inverted_window_is_a_no_op() {
    let gateway = MockGateway::with_pages(vec![page(&[("a", 1_000)], None)]);
    let ctx = test_ctx(test_config(), MemStore::default(), None, gateway, 5_000);

    let outcome = scan_new_posts(
        &ctx,
        ScanWindow {
            start: 2_000,
            end: 1_000,
        },
    )
    .await
    .unwrap();

    assert_eq!(outcome.pages, 0);
    assert!(outcome.post_ids.is_empty());
    assert_eq!(ctx.gateway.served(), 0);
}

#[tokio::test]
async fn post_cap_ends_the_scan_early() {
    let gateway = MockGateway::with_pages(vec![
        page(&[("a", 1_000), ("b", 900), ("c", 800)], Some("p2")),
        page(&[("d", 700)], None),
    ]);
    let mut cfg = test_config();
    cfg.max_posts = 2;
    let ctx = test_ctx(cfg, MemStore::default(), None, gateway, 5_000);

    let outcome = scan_new_posts(
        &ctx,
        ScanWindow {
            start: 0,
            end: i64::MAX,
        },
    )
    .await
    .unwrap();

    assert_eq!(outcome.post_ids, vec!["a", "b"]);
    assert_eq!(ctx.gateway.served(), 1);
}

#[tokio::test]
async fn rescanning_the_same_feed_updates_rather_than_duplicates() {
    let pages = vec![page(&[("a", 1_000)], None), page(&[("a", 1_000)], None)];
    let gateway = MockGateway::with_pages(pages);
    let ctx = test_ctx(test_config(), MemStore::default(), None, gateway, 5_000);
    let window = ScanWindow {
        start: 0,
        end: i64::MAX,
    };

    scan_new_posts(&ctx, window).await.unwrap();
    let first = ctx.primary.post("a").unwrap();
    scan_new_posts(&ctx, window).await.unwrap();
    let second = ctx.primary.post("a").unwrap();

    assert_eq!(ctx.primary.posts.lock().unwrap().len(), 1);
    assert_eq!(second.first_seen, first.first_seen);
    // Identical snapshot, dedup on: the series did not grow.
    assert_eq!(second.series, first.series);
}
