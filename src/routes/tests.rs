use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use super::{NewRoute, RouteStore};
use crate::app::AppError;
use crate::domain::place::PlaceId;
use crate::domain::route::PlaceRef;
use crate::events::{EventBus, StoreEvent};
use crate::storage::Storage;

fn new_route(name: &str) -> NewRoute {
    NewRoute {
        name: name.to_string(),
        city_id: "city-1".to_string(),
        city: "Tokyo".to_string(),
        country: "Japan".to_string(),
        start_date: None,
        end_date: None,
    }
}

fn fixture() -> (Storage, EventBus) {
    (Storage::open_in_memory().expect("open"), EventBus::new())
}

#[test]
fn create_seeds_an_empty_first_day() {
    let (storage, bus) = fixture();
    let store = RouteStore::new(&storage, &bus);
    let route = store.create(new_route("Weekend")).expect("create");
    assert_eq!(route.days.len(), 1);
    assert_eq!(route.days[0].day_number, 1);
    assert!(route.days[0].places.is_empty());
}

#[test]
fn add_place_rejects_duplicates_across_days() {
    let (storage, bus) = fixture();
    let store = RouteStore::new(&storage, &bus);
    let route = store.create(new_route("Weekend")).expect("create");
    store.add_day(&route.id).expect("add day");
    let place = PlaceId::from("p1");

    assert!(store.add_place(&route.id, 1, &place).expect("add"));
    assert!(!store.add_place(&route.id, 2, &place).expect("duplicate"));
}

#[test]
fn removal_renumbers_densely_from_zero() {
    let (storage, bus) = fixture();
    let store = RouteStore::new(&storage, &bus);
    let route = store.create(new_route("Weekend")).expect("create");
    for id in ["a", "b", "c", "d", "e"] {
        store.add_place(&route.id, 1, &PlaceId::from(id)).expect("add");
    }

    store.remove_place(&route.id, &PlaceId::from("b")).expect("remove");
    let reloaded = store.get(&route.id).expect("get").expect("present");
    let orders: Vec<usize> = reloaded.days[0].places.iter().map(|p| p.order).collect();
    assert_eq!(orders, vec![0, 1, 2, 3]);
}

#[test]
fn reorder_rewrites_every_order_field() {
    let (storage, bus) = fixture();
    let store = RouteStore::new(&storage, &bus);
    let route = store.create(new_route("Weekend")).expect("create");
    for id in ["a", "b", "c"] {
        store.add_place(&route.id, 1, &PlaceId::from(id)).expect("add");
    }

    let reloaded = store.get(&route.id).expect("get").expect("present");
    let mut reversed: Vec<PlaceRef> = reloaded.days[0].places.clone();
    reversed.reverse();
    store.reorder(&route.id, 1, reversed).expect("reorder");

    let after = store.get(&route.id).expect("get").expect("present");
    let ids: Vec<&str> = after.days[0]
        .places
        .iter()
        .map(|p| p.place_id.as_str())
        .collect();
    assert_eq!(ids, vec!["c", "b", "a"]);
    let orders: Vec<usize> = after.days[0].places.iter().map(|p| p.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[test]
fn reorder_keeps_each_place_at_most_once() {
    let (storage, bus) = fixture();
    let store = RouteStore::new(&storage, &bus);
    let route = store.create(new_route("Weekend")).expect("create");
    for id in ["a", "b"] {
        store.add_place(&route.id, 1, &PlaceId::from(id)).expect("add");
    }

    let reloaded = store.get(&route.id).expect("get").expect("present");
    let mut doubled: Vec<PlaceRef> = reloaded.days[0].places.clone();
    doubled.insert(1, doubled[0].clone());
    store.reorder(&route.id, 1, doubled).expect("reorder");

    let after = store.get(&route.id).expect("get").expect("present");
    let ids: Vec<&str> = after.days[0]
        .places
        .iter()
        .map(|p| p.place_id.as_str())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
    let orders: Vec<usize> = after.days[0].places.iter().map(|p| p.order).collect();
    assert_eq!(orders, vec![0, 1]);
}

#[test]
fn adding_to_a_missing_day_is_an_error() {
    let (storage, bus) = fixture();
    let store = RouteStore::new(&storage, &bus);
    let route = store.create(new_route("Weekend")).expect("create");

    let result = store.add_place(&route.id, 99, &PlaceId::from("a"));
    assert!(matches!(result, Err(AppError::NotFound(_))));
    // Day 1 still takes the place afterwards.
    assert!(store.add_place(&route.id, 1, &PlaceId::from("a")).expect("add"));
}

#[test]
fn only_empty_days_can_be_removed() {
    let (storage, bus) = fixture();
    let store = RouteStore::new(&storage, &bus);
    let route = store.create(new_route("Weekend")).expect("create");
    store.add_place(&route.id, 1, &PlaceId::from("a")).expect("add");
    store.add_day(&route.id).expect("add day");

    assert!(!store.remove_day(&route.id, 1).expect("occupied"));
    assert!(store.remove_day(&route.id, 2).expect("empty"));
}

#[test]
fn propagation_updates_all_references_with_one_event() {
    let (storage, bus) = fixture();
    let store = RouteStore::new(&storage, &bus);
    let first = store.create(new_route("First")).expect("create");
    let second = store.create(new_route("Second")).expect("create");
    store.add_day(&second.id).expect("add day");
    let place = PlaceId::from("shared");
    store.add_place(&first.id, 1, &place).expect("add");
    store.add_place(&second.id, 1, &PlaceId::from("other")).expect("add");
    store.add_place(&second.id, 2, &place).expect("add");

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    bus.subscribe(move |event: &StoreEvent| sink.borrow_mut().push(event.clone()));

    let updated = store.propagate_visited(&place, true).expect("propagate");
    assert_eq!(updated, 2);
    assert_eq!(
        *seen.borrow(),
        vec![StoreEvent::RouteUpdated { route_id: None }]
    );

    for route in store.list().expect("list") {
        for day in &route.days {
            for place_ref in &day.places {
                if place_ref.place_id == place {
                    assert!(place_ref.visited);
                }
            }
        }
    }
}

#[test]
fn propagation_without_matches_emits_nothing() {
    let (storage, bus) = fixture();
    let store = RouteStore::new(&storage, &bus);
    store.create(new_route("Weekend")).expect("create");

    let seen = Rc::new(RefCell::new(0u32));
    let sink = Rc::clone(&seen);
    bus.subscribe(move |_| *sink.borrow_mut() += 1);

    let updated = store
        .propagate_visited(&PlaceId::from("missing"), true)
        .expect("propagate");
    assert_eq!(updated, 0);
    assert_eq!(*seen.borrow(), 0);
}

#[test]
fn validate_places_prunes_dead_references() {
    let (storage, bus) = fixture();
    let store = RouteStore::new(&storage, &bus);
    let route = store.create(new_route("Weekend")).expect("create");
    for id in ["live", "dead", "also-live"] {
        store.add_place(&route.id, 1, &PlaceId::from(id)).expect("add");
    }

    let known: HashSet<PlaceId> = [PlaceId::from("live"), PlaceId::from("also-live")]
        .into_iter()
        .collect();
    assert!(store.validate_places(&route.id, &known).expect("validate"));

    let reloaded = store.get(&route.id).expect("get").expect("present");
    let ids: Vec<&str> = reloaded.days[0]
        .places
        .iter()
        .map(|p| p.place_id.as_str())
        .collect();
    assert_eq!(ids, vec!["live", "also-live"]);
    let orders: Vec<usize> = reloaded.days[0].places.iter().map(|p| p.order).collect();
    assert_eq!(orders, vec![0, 1]);

    // A second pass has nothing left to prune.
    assert!(!store.validate_places(&route.id, &known).expect("validate"));
}

#[test]
fn create_from_collection_seeds_day_one_in_display_order() {
    let (storage, bus) = fixture();
    let store = RouteStore::new(&storage, &bus);
    let collection = crate::domain::collection::Collection {
        id: "c1".to_string(),
        name: "Weekend picks".to_string(),
        place_ids: vec![PlaceId::from("a"), PlaceId::from("b"), PlaceId::from("c")],
        route_mode: true,
        ordered_place_ids: Some(vec![
            PlaceId::from("c"),
            PlaceId::from("a"),
            PlaceId::from("b"),
        ]),
        created_at: "2026-01-01T00:00:00Z".to_string(),
        last_modified: "2026-01-01T00:00:00Z".to_string(),
    };

    let route = store
        .create_from_collection(&collection, new_route("From picks"))
        .expect("create");
    let ids: Vec<&str> = route.days[0]
        .places
        .iter()
        .map(|p| p.place_id.as_str())
        .collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
    let orders: Vec<usize> = route.days[0].places.iter().map(|p| p.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[test]
fn grouping_buckets_by_derived_status() {
    let (storage, bus) = fixture();
    let store = RouteStore::new(&storage, &bus);

    let mut dated = new_route("Future");
    dated.start_date = Some("2999-01-01".to_string());
    store.create(dated).expect("create");

    let undated = store.create(new_route("Someday")).expect("create");
    let completed = store.create(new_route("Done")).expect("create");
    store.add_place(&completed.id, 1, &PlaceId::from("a")).expect("add");
    store.set_visited(&completed.id, &PlaceId::from("a"), true).expect("visit");

    let grouped = store.grouped().expect("grouped");
    assert_eq!(grouped.upcoming.len(), 1);
    assert_eq!(grouped.completed.len(), 1);
    assert_eq!(grouped.undated.len(), 1);
    assert_eq!(grouped.undated[0].id, undated.id);
    assert!(grouped.ongoing.is_empty() && grouped.past.is_empty());
}
