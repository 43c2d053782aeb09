//! Change notifications emitted to the presentation layer.

use std::sync::mpsc::channel;
use std::sync::Mutex;
use std::time::Duration;

use stockroom::{events, SnapshotNotice, SortMode, StoreError, ViewParameters};

use crate::support::{catalog, draft, mount, seeded_store};

const WAIT: Duration = Duration::from_secs(2);

#[test]
fn params_change_is_emitted() {
    let store = seeded_store(&catalog());
    let mut view = mount(&store);
    let (tx, rx) = channel();
    let tx = Mutex::new(tx);
    view.on(events::PARAMS, move |params: ViewParameters| {
        let _ = tx.lock().unwrap().send(params);
    });

    view.set_sort_mode(SortMode::CountDesc);

    let params = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(params.sort_mode, SortMode::CountDesc);
}

#[test]
fn snapshot_is_emitted_after_remote_write() {
    let store = seeded_store(&catalog());
    let mut view = mount(&store);
    let (tx, rx) = channel();
    let tx = Mutex::new(tx);
    view.on(events::SNAPSHOT, move |notice: SnapshotNotice| {
        let _ = tx.lock().unwrap().send(notice);
    });

    *view.draft_mut() = draft("F6", "Clamp", "Zeta");
    view.add_item().unwrap();

    let notice = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(notice.records, 6);
    assert_eq!(notice.revision, view.mirror().revision());
}

#[test]
fn channel_error_is_emitted() {
    let store = seeded_store(&catalog());
    let view = mount(&store);
    let (tx, rx) = channel();
    let tx = Mutex::new(tx);
    view.on(events::ERROR, move |message: String| {
        let _ = tx.lock().unwrap().send(message);
    });

    store.push_error("equipment", StoreError::Unavailable("offline".into()));

    let message = rx.recv_timeout(WAIT).unwrap();
    assert!(message.contains("offline"));
    assert_eq!(view.mirror().len(), 5);
    assert!(view.status().error().is_some());
}

#[test]
fn removed_listener_stops_receiving() {
    let store = seeded_store(&catalog());
    let mut view = mount(&store);
    let (tx, rx) = channel();
    let tx = Mutex::new(tx);
    let id = view.on(events::SELECTION, move |selected: Option<String>| {
        let _ = tx.lock().unwrap().send(selected);
    });

    view.select("A1");
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), Some("A1".to_string()));

    assert!(view.remove_listener(&id));
    view.clear_selection();
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}
