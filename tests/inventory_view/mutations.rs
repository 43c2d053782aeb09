//! Add/update/delete scenarios, observed through the mirror.

use stockroom::{MutationError, StoreError, ValidationError, WriteOp};

use crate::support::{catalog, draft, mount, seeded_store};

#[test]
fn duplicate_id_is_rejected_and_first_write_wins() {
    let store = seeded_store(&[]);
    let mut view = mount(&store);

    *view.draft_mut() = draft("X1", "Bolt", "Acme");
    view.add_item().unwrap();

    *view.draft_mut() = draft("X1", "Nut", "Acme");
    let err = view.add_item().unwrap_err();

    assert_eq!(err, MutationError::DuplicateId { id: "X1".into() });
    assert!(err.reason().contains("may already exist"));

    let records = view.mirror().records();
    let matching: Vec<_> = records.iter().filter(|r| r.id == "X1").collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].name, "Bolt");
}

#[test]
fn empty_id_is_rejected_without_a_remote_call() {
    let store = seeded_store(&[]);
    let mut view = mount(&store);

    *view.draft_mut() = draft("", "Bolt", "Acme");
    let err = view.add_item().unwrap_err();

    assert_eq!(
        err,
        MutationError::Validation(ValidationError::MissingField("id"))
    );
    assert_eq!(store.write_count(), 0);
    assert!(view.mirror().is_empty());
}

#[test]
fn non_numeric_quantities_become_zero() {
    let store = seeded_store(&[]);
    let mut view = mount(&store);

    let mut d = draft("X1", "Bolt", "Acme");
    d.count = "lots".into();
    d.bought_price = "".into();
    d.sold_price = "4.25".into();
    *view.draft_mut() = d;
    view.add_item().unwrap();

    let stored = view.mirror().get("X1").unwrap();
    assert_eq!(stored.count, 0);
    assert_eq!(stored.bought_price, 0.0);
    assert_eq!(stored.sold_price, 4.25);
}

#[test]
fn update_is_visible_after_next_snapshot() {
    let store = seeded_store(&catalog());
    let mut view = mount(&store);
    let before = view.mirror().revision();

    view.select("C3");
    view.edit_selected(|edit| {
        edit.brand = "Bosch".into();
        edit.sold_price = "99".into();
    });
    view.save_selected().unwrap();

    assert!(view.mirror().revision() > before);
    let projection = view.projection();
    let bosch = projection.group("Bosch").unwrap();
    assert!(bosch.records.iter().any(|r| r.id == "C3" && r.sold_price == 99.0));
    assert!(projection
        .group("Acme")
        .unwrap()
        .records
        .iter()
        .all(|r| r.id != "C3"));
}

#[test]
fn failed_update_leaves_mirror_and_params_untouched() {
    let store = seeded_store(&catalog());
    let mut view = mount(&store);
    view.set_search_text("filter");
    let revision = view.mirror().revision();
    let params = view.params().clone();

    view.select("A1");
    view.edit_selected(|edit| edit.name = "Renamed".into());
    store.fail_next_write(StoreError::PermissionDenied("read-only".into()));

    let err = view.save_selected().unwrap_err();

    assert!(matches!(
        err,
        MutationError::RemoteWrite {
            op: WriteOp::Update,
            ..
        }
    ));
    assert_eq!(view.mirror().revision(), revision);
    assert_eq!(view.mirror().get("A1").unwrap().name, "Filter");
    assert_eq!(*view.params(), params);
    assert!(view.selected().is_some());
}

#[test]
fn cancelled_delete_issues_no_write() {
    let store = seeded_store(&catalog());
    let mut view = mount(&store);
    let writes = store.write_count();

    view.select("D4");
    let confirmation = view.request_delete_selected().unwrap();
    assert!(confirmation.prompt().contains("Belt"));
    confirmation.cancel();

    assert_eq!(store.write_count(), writes);
    assert!(view.mirror().get("D4").is_some());
}

#[test]
fn confirmed_delete_removes_record() {
    let store = seeded_store(&catalog());
    let mut view = mount(&store);
    let record = view.mirror().get("D4").unwrap();

    let token = view.request_delete(&record).accept();
    view.delete(token).unwrap();

    assert!(view.mirror().get("D4").is_none());
    assert!(view.projection().group("Zeta").is_none());
    assert!(view
        .projection()
        .distinct_brands
        .iter()
        .all(|b| b != "Zeta"));
}

#[test]
fn delete_of_vanished_record_is_a_remote_write_error() {
    let store = seeded_store(&catalog());
    let mut view = mount(&store);
    let record = view.mirror().get("E5").unwrap();

    let first = view.request_delete(&record).accept();
    let second = view.request_delete(&record).accept();
    view.delete(first).unwrap();

    let err = view.delete(second).unwrap_err();
    assert!(matches!(
        err,
        MutationError::RemoteWrite {
            op: WriteOp::Delete,
            source: StoreError::NotFound { .. },
            ..
        }
    ));
}
