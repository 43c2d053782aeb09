//! Integration tests for the inventory view: projection behaviour and
//! mutations observed through the live mirror.

mod mutations;
#[cfg(feature = "emitter")]
mod notifications;

use stockroom::{project, SortMode, ViewParameters};
use support::{catalog, ids, mount, record, seeded_store};

#[test]
fn search_matches_id_or_name() {
    let store = seeded_store(&[
        record("A1", "Filter", "Acme", 2, 1.0),
        record("B2", "Valve", "Acme", 2, 1.0),
    ]);
    let mut view = mount(&store);

    view.set_search_text("fil");

    assert_eq!(ids(&view), vec!["A1"]);
}

#[test]
fn grouping_is_complete_and_disjoint() {
    let store = seeded_store(&catalog());
    let mut view = mount(&store);
    view.set_search_text("e");
    view.set_max_count(Some(8));

    let projection = view.projection();
    let mut grouped: Vec<String> = projection.records().map(|r| r.id.clone()).collect();
    grouped.sort();

    let needle = "e";
    let mut expected: Vec<String> = catalog()
        .into_iter()
        .filter(|r| r.id.to_lowercase().contains(needle) || r.name.to_lowercase().contains(needle))
        .filter(|r| r.count <= 8)
        .map(|r| r.id)
        .collect();
    expected.sort();

    assert_eq!(grouped, expected);
    for group in &projection.groups {
        assert!(group.records.iter().all(|r| r.brand == group.brand));
    }
    let brands: Vec<&str> = projection.groups.iter().map(|g| g.brand.as_str()).collect();
    let mut unique = brands.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), brands.len());
}

#[test]
fn sold_price_ascending_holds_across_flattened_sort() {
    let mut params = ViewParameters::new();
    params.set_sort_mode(SortMode::SoldPriceAsc);
    let projection = project(&catalog(), &params);

    for group in &projection.groups {
        for pair in group.records.windows(2) {
            assert!(pair[0].sold_price <= pair[1].sold_price);
        }
    }
}

#[test]
fn tightening_max_count_never_grows_projection() {
    let store = seeded_store(&catalog());
    let mut view = mount(&store);

    let mut previous = view.projection().len();
    for ceiling in (0..=9).rev() {
        view.set_max_count(Some(ceiling));
        let len = view.projection().len();
        assert!(len <= previous, "ceiling {ceiling} grew the projection");
        previous = len;
    }
}

#[test]
fn default_ceiling_tracks_new_maximum() {
    let store = seeded_store(&catalog());
    let mut view = mount(&store);
    assert_eq!(view.projection().observed_max_count, 9);
    assert_eq!(view.projection().effective_max_count, 9);

    view.draft_mut().id = "F6".into();
    view.draft_mut().name = "Clamp".into();
    view.draft_mut().brand = "Zeta".into();
    view.draft_mut().count = "50".into();
    view.add_item().unwrap();

    let projection = view.projection();
    assert_eq!(projection.observed_max_count, 50);
    assert_eq!(projection.effective_max_count, 50);
    assert!(projection.records().any(|r| r.id == "F6"));
}

#[test]
fn empty_mirror_projects_to_nothing() {
    let store = seeded_store(&[]);
    let view = mount(&store);

    let projection = view.projection();
    assert!(projection.is_empty());
    assert_eq!(projection.observed_max_count, 0);
    assert_eq!(projection.effective_max_count, 0);
}

#[test]
fn clear_filters_restores_unfiltered_projection() {
    let store = seeded_store(&catalog());
    let mut view = mount(&store);
    let unfiltered = view.projection();

    view.set_brand_filter(Some("Acme".into()));
    view.set_max_count(Some(5));
    view.set_search_text("x");
    assert!(view.projection().is_empty());

    view.clear_all();

    assert_eq!(*view.params(), ViewParameters::default());
    assert_eq!(*view.projection(), *unfiltered);
}

#[test]
fn brand_options_list_every_brand_sorted() {
    let store = seeded_store(&catalog());
    let mut view = mount(&store);
    view.set_brand_filter(Some("Zeta".into()));

    let projection = view.projection();
    let values: Vec<String> = projection.brand_options().into_iter().map(|o| o.value).collect();
    assert_eq!(values, vec!["Acme", "Bosch", "Zeta"]);
    assert_eq!(projection.groups.len(), 1);
}
