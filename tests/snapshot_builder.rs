//! Snapshot builder tests against canned page captures

mod common;

use serde_json::json;
use std::sync::Arc;

use common::*;
use webinspector::browser::Browser;
use webinspector::core::Coordinates;
use webinspector::dom::{SnapshotBuilder, ViewportExpansion, EMPTY_TREE_HASH};

fn builder(browser: &Arc<FakeBrowser>) -> SnapshotBuilder {
    SnapshotBuilder::new(browser.clone(), ViewportExpansion::Pixels(0))
}

#[tokio::test]
async fn test_snapshot_indexes_interactive_elements() {
    let browser = shared(FakeBrowser::new(login_page()));
    let mut snapshots = builder(&browser);

    let snapshot = snapshots.snapshot().await.unwrap();
    assert_eq!(snapshot.indexed_count, 3);
    assert_eq!(
        snapshot.serialized,
        [
            r#"[1]__<input name="username" type="text"></input>"#,
            r#"[2]__<input name="password" type="password"></input>"#,
            r#"[3]__<button type="submit">Sign in</button>"#,
        ]
        .join("\n")
    );

    for el in snapshot.root.elements() {
        if el.highlight_index.is_some() {
            assert!(el.interactive && el.visible && el.topmost);
        }
    }

    assert_eq!(snapshots.resolve(1), Some(Coordinates::new(120.0, 40.0)));
    assert_eq!(snapshots.resolve(3), Some(Coordinates::new(120.0, 140.0)));
    assert_eq!(snapshots.resolve(0), None);
    assert_eq!(snapshots.resolve(4), None);
}

#[tokio::test]
async fn test_current_hash_leaves_selector_map_alone() {
    let browser = shared(FakeBrowser::new(login_page()).then(dashboard_page()));
    let mut snapshots = builder(&browser);

    let before = snapshots.snapshot().await.unwrap();
    assert_eq!(snapshots.current_hash().await, before.hash);

    // move the fake page on
    browser.click(Coordinates::new(1.0, 1.0)).await.unwrap();

    let live = snapshots.current_hash().await;
    assert_ne!(live, before.hash);
    assert_eq!(snapshots.selector_map().get(1).unwrap().tag, "input");

    let after = snapshots.snapshot().await.unwrap();
    assert_eq!(after.hash, live);
    assert_eq!(snapshots.selector_map().get(1).unwrap().tag, "a");
}

#[tokio::test]
async fn test_failed_capture_clears_selector_map() {
    let browser = shared(FakeBrowser::new(login_page()).then(json!("garbage")));
    let mut snapshots = builder(&browser);

    snapshots.snapshot().await.unwrap();
    assert!(snapshots.resolve(1).is_some());

    browser.click(Coordinates::new(1.0, 1.0)).await.unwrap();

    assert!(snapshots.snapshot().await.is_none());
    assert!(snapshots.resolve(1).is_none());
    assert_eq!(snapshots.current_hash().await, EMPTY_TREE_HASH);
}

#[tokio::test]
async fn test_offscreen_and_covered_elements_are_not_indexed() {
    let mut below = element(0, "button", json!({"id": "below"}), 0);
    below["rect"]["y"] = json!(5000.0);
    below["hit"] = json!(null);

    let mut covered = element(0, "button", json!({"id": "covered"}), 1);
    covered["hit"] = json!(false);

    let mut hidden = element(0, "a", json!({"href": "/x"}), 2);
    hidden["display"] = json!("none");

    let visible = element(0, "button", json!({"id": "ok"}), 3);

    let browser = shared(FakeBrowser::new(page(vec![below, covered, hidden, visible])));
    let mut snapshots = builder(&browser);
    let snapshot = snapshots.snapshot().await.unwrap();

    assert_eq!(snapshot.indexed_count, 1);
    assert_eq!(
        snapshots.selector_map().get(1).unwrap().attribute("id"),
        Some("ok")
    );

    // without the spatial filter the offscreen button is indexed too
    let browser = shared(FakeBrowser::new(page(vec![
        {
            let mut below = element(0, "button", json!({"id": "below"}), 0);
            below["rect"]["y"] = json!(5000.0);
            below["hit"] = json!(null);
            below
        },
    ])));
    let mut unfiltered = SnapshotBuilder::new(browser.clone(), ViewportExpansion::Disabled);
    assert_eq!(unfiltered.snapshot().await.unwrap().indexed_count, 1);
}

#[tokio::test]
async fn test_highlights_do_not_disturb_capture() {
    let browser = shared(FakeBrowser::new(login_page()));
    let mut snapshots = builder(&browser).with_highlights(true);

    let first = snapshots.snapshot().await.unwrap();
    snapshots.clear_highlights().await;
    snapshots
        .highlight_pointer(Coordinates::new(120.0, 40.0))
        .await;
    let second = snapshots.snapshot().await.unwrap();

    assert_eq!(first.hash, second.hash);
    assert_eq!(browser.captures(), 2);
}
