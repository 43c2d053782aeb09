//! Integration tests for the live mirror: settle-through-snapshot
//! consistency, coalesced deliveries, and subscription lifetime.

use std::sync::Arc;
use std::thread;

use tracing_subscriber::EnvFilter;

use stockroom::{
    DocumentsExt, InMemoryDocumentStore, InventoryView, LiveMirror, MirrorStatus, Record,
    RecordDraft, StoreError, ViewConfig,
};

/// Route engine logs through the test harness; `RUST_LOG=stockroom=debug`
/// shows snapshot and mutation traffic.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn draft(id: &str, name: &str, brand: &str) -> RecordDraft {
    RecordDraft {
        id: id.into(),
        name: name.into(),
        brand: brand.into(),
        ..RecordDraft::default()
    }
}

#[test]
fn view_is_loading_until_first_snapshot() {
    init_tracing();
    let store = InMemoryDocumentStore::deferred();
    let view = InventoryView::mount(store.clone(), &ViewConfig::default()).unwrap();

    assert!(view.is_loading());
    assert!(view.projection().is_empty());

    store.flush();

    assert_eq!(view.status(), MirrorStatus::Ready);
}

#[test]
fn accepted_write_is_not_applied_optimistically() {
    init_tracing();
    let store = InMemoryDocumentStore::deferred();
    let mut view = InventoryView::mount(store.clone(), &ViewConfig::default()).unwrap();
    store.flush();

    *view.draft_mut() = draft("X1", "Bolt", "Acme");
    view.add_item().unwrap();

    assert!(view.mirror().get("X1").is_none());
    assert!(view.projection().is_empty());

    store.flush();

    assert!(view.mirror().get("X1").is_some());
    assert_eq!(view.projection().len(), 1);
}

#[test]
fn rapid_changes_coalesce_into_one_snapshot() {
    init_tracing();
    let store = InMemoryDocumentStore::deferred();
    let mut view = InventoryView::mount(store.clone(), &ViewConfig::default()).unwrap();
    store.flush();
    let revision = view.mirror().revision();

    for (id, name) in [("A1", "Filter"), ("B2", "Valve"), ("C3", "Hose")] {
        *view.draft_mut() = draft(id, name, "Acme");
        view.add_item().unwrap();
    }
    assert_eq!(store.flush(), 1);

    assert_eq!(view.mirror().revision(), revision + 1);
    assert_eq!(view.mirror().len(), 3);
}

#[test]
fn error_then_recovery_keeps_last_good_records() {
    init_tracing();
    let store = InMemoryDocumentStore::new();
    store
        .documents::<Record>()
        .create(&Record::new("A1", "Filter", "Acme"))
        .unwrap();
    let view = InventoryView::mount(store.clone(), &ViewConfig::default()).unwrap();

    store.push_error("equipment", StoreError::PermissionDenied("rules".into()));
    assert!(view.status().error().is_some());
    assert_eq!(view.projection().len(), 1);

    store
        .documents::<Record>()
        .create(&Record::new("B2", "Valve", "Acme"))
        .unwrap();
    assert_eq!(view.status(), MirrorStatus::Ready);
    assert_eq!(view.projection().len(), 2);
}

#[test]
fn store_key_is_authoritative_over_body_id() {
    let store = InMemoryDocumentStore::new();
    let body = match serde_json::json!({ "id": "WRONG", "name": "Filter", "brand": "Acme", "count": 2 }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };
    stockroom::DocumentStore::create(&store, "equipment", "A1", body).unwrap();

    let live = LiveMirror::subscribe(&store, "equipment", |_| {}).unwrap();

    assert_eq!(live.mirror().records()[0].id, "A1");
}

#[test]
fn string_typed_body_is_mirrored() {
    let store = InMemoryDocumentStore::new();
    let body = match serde_json::json!({ "name": "Filter", "brand": "Acme", "count": "5", "soldPrice": "12" }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };
    stockroom::DocumentStore::create(&store, "equipment", "A1", body).unwrap();

    let mut view = InventoryView::mount(store.clone(), &ViewConfig::default()).unwrap();

    let record = view.mirror().get("A1").unwrap();
    assert_eq!(record.count, 5);
    assert_eq!(record.sold_price, 12.0);
    assert_eq!(view.projection().len(), 1);
    assert!(view.select("A1"));
}

#[test]
fn configured_collection_is_followed() {
    let store = InMemoryDocumentStore::new();
    store
        .documents_in::<Record>("spares")
        .create(&Record::new("S1", "Spring", "Acme"))
        .unwrap();
    store
        .documents::<Record>()
        .create(&Record::new("E1", "Engine", "Acme"))
        .unwrap();

    let mut view =
        InventoryView::mount(store.clone(), &ViewConfig::new().collection("spares")).unwrap();
    assert_eq!(view.mirror().records()[0].id, "S1");
    assert_eq!(view.mirror().len(), 1);

    *view.draft_mut() = draft("S2", "Shim", "Acme");
    view.add_item().unwrap();
    assert!(store.get("spares", "S2").unwrap().is_some());
    assert!(store.get("equipment", "S2").unwrap().is_none());
}

#[test]
fn unmount_releases_the_only_subscription() {
    let store = InMemoryDocumentStore::new();
    let first = InventoryView::mount(store.clone(), &ViewConfig::default()).unwrap();
    assert_eq!(store.listener_count("equipment"), 1);

    first.unmount();
    assert_eq!(store.listener_count("equipment"), 0);

    let second = InventoryView::mount(store.clone(), &ViewConfig::default()).unwrap();
    assert_eq!(store.listener_count("equipment"), 1);
    assert!(second.is_subscribed());
}

#[test]
fn early_return_still_releases_subscription() {
    fn mounted_then_bail(store: &InMemoryDocumentStore) -> Result<(), String> {
        let view = InventoryView::mount(store.clone(), &ViewConfig::default())
            .map_err(|e| e.to_string())?;
        if view.projection().is_empty() {
            return Err("nothing to show".into());
        }
        Ok(())
    }

    let store = InMemoryDocumentStore::new();
    assert!(mounted_then_bail(&store).is_err());
    assert_eq!(store.listener_count("equipment"), 0);
}

#[test]
fn concurrent_writers_settle_to_final_state() {
    init_tracing();
    let store = InMemoryDocumentStore::new();
    let view = InventoryView::mount(store.clone(), &ViewConfig::default()).unwrap();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for n in 0..10 {
                    let record = Record::new(format!("W{worker}-{n}"), "Part", format!("B{worker}"))
                        .with_count(n);
                    store.documents::<Record>().create(&record).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(view.mirror().len(), 40);
    let projection = view.projection();
    assert_eq!(projection.len(), 40);
    assert_eq!(projection.distinct_brands, vec!["B0", "B1", "B2", "B3"]);
    assert_eq!(projection.observed_max_count, 9);
}
