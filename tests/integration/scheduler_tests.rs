//! Batch scheduler tests

use crate::support::*;
use chrono::{TimeZone, Utc};
use index_relay::client::{build_http_client, InspectionClient};
use index_relay::scheduler::BatchScheduler;
use index_relay::state::IndexStatus;
use index_relay::auth::TokenCache;
use index_relay::store::{ItemRecord, ItemStore, SharedItemStore, StoreResult};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ts(day: u32, hour: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
}

async fn mount_unknown_inspection(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/inspection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(server)
        .await;
}

fn scheduler_for(store: SharedItemStore, settings: index_relay::config::Settings) -> BatchScheduler {
    let settings = Arc::new(settings);
    let http = build_http_client().unwrap();
    let tokens = Arc::new(TokenCache::new(http.clone()));
    let inspector = InspectionClient::new(http, settings.clone(), tokens, store.clone());
    BatchScheduler::new(settings, inspector, store)
}

#[tokio::test]
async fn never_checked_items_fill_the_batch_before_any_stale_item() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "bearer-ro").await;

    // The slow tier processes exactly 20 items per tick.
    Mock::given(method("POST"))
        .and(path("/inspection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(20)
        .mount(&server)
        .await;

    let store = shared_store();
    let mut never_checked = Vec::new();
    let mut stale = Vec::new();
    {
        let mut guard = store.lock().unwrap();
        // 25 never-checked items published at distinct times.
        for n in 0..25u32 {
            let id = guard
                .track_item(
                    &format!("https://example.com/new-{}", n),
                    "post",
                    ts(1, 0) + chrono::Duration::minutes(i64::from(n)),
                )
                .unwrap();
            never_checked.push((id, n));
        }
        // 10 stale items checked long ago.
        for n in 0..10u32 {
            let id = guard
                .track_item(&format!("https://example.com/old-{}", n), "post", ts(1, 0))
                .unwrap();
            let checked = ts(2, 0) + chrono::Duration::minutes(i64::from(n));
            guard.set_last_checked(id, checked).unwrap();
            stale.push((id, checked.to_rfc3339()));
        }
    }

    let settings = test_settings(&server, Some(service_account_json(&server)));
    let scheduler = scheduler_for(store.clone(), settings);

    let summary = scheduler.run_tick().await.unwrap();
    assert_eq!(summary.selected, 20);
    assert_eq!(summary.inspected, 20);
    assert_eq!(summary.failed, 0);

    let guard = store.lock().unwrap();

    // The 20 newest never-checked items got checked; the 5 oldest did not.
    for (id, n) in &never_checked {
        let item = guard.get_item(*id).unwrap();
        if *n >= 5 {
            assert!(item.last_checked_at.is_some(), "item {} not checked", id);
        } else {
            assert!(item.last_checked_at.is_none(), "item {} checked early", id);
        }
    }

    // The stale set was never touched this tick.
    for (id, original) in &stale {
        let item = guard.get_item(*id).unwrap();
        assert_eq!(item.last_checked_at.as_deref(), Some(original.as_str()));
    }
}

#[tokio::test]
async fn underfilled_batch_tops_up_with_the_stalest_items() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "bearer-ro").await;
    mount_unknown_inspection(&server).await;

    let store = shared_store();
    let mut stale = Vec::new();
    {
        let mut guard = store.lock().unwrap();
        // 2 never-checked items.
        for n in 0..2 {
            guard
                .track_item(&format!("https://example.com/new-{}", n), "post", ts(1, n))
                .unwrap();
        }
        // 30 stale items; the first checked is the stalest.
        for n in 0..30u32 {
            let id = guard
                .track_item(&format!("https://example.com/old-{}", n), "post", ts(1, 0))
                .unwrap();
            guard
                .set_last_checked(id, ts(3, 0) + chrono::Duration::minutes(i64::from(n)))
                .unwrap();
            stale.push((id, n));
        }
    }

    let settings = test_settings(&server, Some(service_account_json(&server)));
    let scheduler = scheduler_for(store.clone(), settings);

    let summary = scheduler.run_tick().await.unwrap();
    // 2 never-checked + 18 stale fill the slow-tier batch of 20.
    assert_eq!(summary.selected, 20);
    assert_eq!(summary.inspected, 20);

    let guard = store.lock().unwrap();
    for (id, n) in &stale {
        let item = guard.get_item(*id).unwrap();
        let original = (ts(3, 0) + chrono::Duration::minutes(i64::from(*n))).to_rfc3339();
        if *n < 18 {
            // Re-checked this tick: the timestamp moved.
            assert_ne!(item.last_checked_at.as_deref(), Some(original.as_str()));
        } else {
            // The 12 most-recently-checked items kept their timestamps.
            assert_eq!(item.last_checked_at.as_deref(), Some(original.as_str()));
        }
    }
}

#[tokio::test]
async fn one_failing_item_does_not_abort_the_batch() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "bearer-ro").await;

    // Every inspection answers 500; the per-item failure path runs for the
    // whole batch and the tick still completes.
    Mock::given(method("POST"))
        .and(path("/inspection"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
        .expect(3)
        .mount(&server)
        .await;

    let store = shared_store();
    {
        let mut guard = store.lock().unwrap();
        for n in 0..3 {
            guard
                .track_item(&format!("https://example.com/p-{}", n), "post", ts(1, n))
                .unwrap();
        }
    }

    let settings = test_settings(&server, Some(service_account_json(&server)));
    let scheduler = scheduler_for(store.clone(), settings);

    let summary = scheduler.run_tick().await.unwrap();
    assert_eq!(summary.selected, 3);
    assert_eq!(summary.inspected, 0);
    assert_eq!(summary.failed, 3);
}

#[tokio::test]
async fn a_failing_item_mid_batch_leaves_the_rest_processed() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "bearer-ro").await;

    // Only the middle item's inspection breaks.
    Mock::given(method("POST"))
        .and(path("/inspection"))
        .and(wiremock::matchers::body_partial_json(serde_json::json!({
            "inspectionUrl": "https://example.com/p-1",
        })))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
        .mount(&server)
        .await;
    mount_unknown_inspection(&server).await;

    let store = shared_store();
    let mut ids = Vec::new();
    {
        let mut guard = store.lock().unwrap();
        for n in 0..3 {
            ids.push(
                guard
                    .track_item(&format!("https://example.com/p-{}", n), "post", ts(1, n))
                    .unwrap(),
            );
        }
    }

    let settings = test_settings(&server, Some(service_account_json(&server)));
    let scheduler = scheduler_for(store.clone(), settings);

    let summary = scheduler.run_tick().await.unwrap();
    assert_eq!(summary.selected, 3);
    assert_eq!(summary.inspected, 2);
    assert_eq!(summary.failed, 1);

    let guard = store.lock().unwrap();
    let checked: Vec<bool> = ids
        .iter()
        .map(|id| guard.get_item(*id).unwrap().last_checked_at.is_some())
        .collect();
    // p-1 failed, the items around it were still processed.
    assert_eq!(checked.iter().filter(|c| **c).count(), 2);
}

#[tokio::test]
async fn disabled_scan_is_a_no_op() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = shared_store();
    store
        .lock()
        .unwrap()
        .track_item("https://example.com/post", "post", ts(1, 0))
        .unwrap();

    let mut settings = test_settings(&server, Some(service_account_json(&server)));
    settings.scan_enabled = false;
    let scheduler = scheduler_for(store.clone(), settings);

    let summary = scheduler.run_tick().await.unwrap();
    assert_eq!(summary.selected, 0);
}

#[tokio::test]
async fn empty_item_type_allow_list_is_a_no_op() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = shared_store();
    store
        .lock()
        .unwrap()
        .track_item("https://example.com/post", "post", ts(1, 0))
        .unwrap();

    let mut settings = test_settings(&server, Some(service_account_json(&server)));
    settings.item_types.clear();
    let scheduler = scheduler_for(store.clone(), settings);

    let summary = scheduler.run_tick().await.unwrap();
    assert_eq!(summary.selected, 0);
}

/// A stub item store for selection edge cases the SQLite store cannot
/// produce (unresolvable URLs, duplicate selections)
struct StubStore {
    batch: Vec<ItemRecord>,
    resolvable: bool,
    checked_writes: Vec<i64>,
}

impl StubStore {
    fn record(id: i64) -> ItemRecord {
        ItemRecord {
            id,
            item_type: "post".to_string(),
            url: format!("https://example.com/p-{}", id),
            published_at: ts(1, 0).to_rfc3339(),
            status: IndexStatus::Unknown,
            last_checked_at: None,
            last_submitted_at: None,
        }
    }
}

impl ItemStore for StubStore {
    fn find_never_checked(&self, _types: &[String], limit: usize) -> StoreResult<Vec<ItemRecord>> {
        Ok(self.batch.iter().take(limit).cloned().collect())
    }

    fn find_oldest_checked(&self, _types: &[String], _limit: usize) -> StoreResult<Vec<ItemRecord>> {
        Ok(Vec::new())
    }

    fn canonical_url(&self, item_id: i64) -> StoreResult<Option<String>> {
        if self.resolvable {
            Ok(Some(format!("https://example.com/p-{}", item_id)))
        } else {
            Ok(None)
        }
    }

    fn resolve_item_id(&self, _url: &str) -> StoreResult<Option<i64>> {
        Ok(None)
    }

    fn set_status(&mut self, _item_id: i64, _status: IndexStatus) -> StoreResult<()> {
        Ok(())
    }

    fn set_last_checked(
        &mut self,
        item_id: i64,
        _ts: chrono::DateTime<Utc>,
    ) -> StoreResult<()> {
        self.checked_writes.push(item_id);
        Ok(())
    }

    fn set_last_submitted(
        &mut self,
        _item_id: i64,
        _ts: chrono::DateTime<Utc>,
    ) -> StoreResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn unresolvable_items_are_skipped_without_side_effects() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/inspection"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let stub = Arc::new(Mutex::new(StubStore {
        batch: vec![StubStore::record(1), StubStore::record(2)],
        resolvable: false,
        checked_writes: Vec::new(),
    }));
    let store: SharedItemStore = stub.clone();

    let settings = test_settings(&server, Some(service_account_json(&server)));
    let scheduler = scheduler_for(store, settings);

    let summary = scheduler.run_tick().await.unwrap();
    assert_eq!(summary.selected, 2);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.inspected, 0);
    assert!(stub.lock().unwrap().checked_writes.is_empty());
}

#[tokio::test]
async fn duplicate_selection_is_tolerated() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "bearer-ro").await;
    mount_unknown_inspection(&server).await;

    // The same item appearing twice in one batch just writes its state
    // twice; nothing corrupts and nothing aborts.
    let stub = Arc::new(Mutex::new(StubStore {
        batch: vec![StubStore::record(7), StubStore::record(7)],
        resolvable: true,
        checked_writes: Vec::new(),
    }));
    let store: SharedItemStore = stub.clone();

    let settings = test_settings(&server, Some(service_account_json(&server)));
    let scheduler = scheduler_for(store, settings);

    let summary = scheduler.run_tick().await.unwrap();
    assert_eq!(summary.selected, 2);
    assert_eq!(summary.inspected, 2);
    assert_eq!(stub.lock().unwrap().checked_writes, vec![7, 7]);
}
