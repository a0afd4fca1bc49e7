use std::cell::RefCell;

use super::App;
use crate::cloud::{PlaceDoc, ReconcileState, RemoteError, RemoteStore};
use crate::images::PlaceholderImages;
use crate::parser::ParseInput;
use crate::storage::Storage;

/// Remote double: records upserts, serves canned documents, optionally
/// fails everything.
#[derive(Default)]
struct FakeRemote {
    docs: RefCell<Vec<PlaceDoc>>,
    offline: bool,
}

impl RemoteStore for FakeRemote {
    fn fetch_places(&self, user_id: &str) -> Result<Vec<PlaceDoc>, RemoteError> {
        if self.offline {
            return Err(std::io::Error::other("offline").into());
        }
        Ok(self
            .docs
            .borrow()
            .iter()
            .filter(|doc| doc.user_id == user_id)
            .cloned()
            .collect())
    }

    fn upsert_places(&self, docs: &[PlaceDoc]) -> Result<(), RemoteError> {
        if self.offline {
            return Err(std::io::Error::other("offline").into());
        }
        let mut stored = self.docs.borrow_mut();
        for doc in docs {
            match stored.iter_mut().find(|existing| existing.id == doc.id) {
                Some(existing) => *existing = doc.clone(),
                None => stored.push(doc.clone()),
            }
        }
        Ok(())
    }
}

fn app() -> App {
    app_with_remote(FakeRemote::default())
}

fn app_with_remote(remote: FakeRemote) -> App {
    App::new(
        Storage::open_in_memory().expect("open"),
        Box::new(remote),
        Box::new(PlaceholderImages),
        "user-1",
    )
}

fn text_input(text: &str) -> ParseInput {
    ParseInput::Text(text.to_string())
}

#[test]
fn merging_twice_yields_one_bucket_and_one_place() {
    let app = app();
    app.add_recommendation("Tokyo", text_input("Ichiran"), None)
        .expect("add");
    app.add_recommendation("tokyo ", text_input("ichiran"), None)
        .expect("add");

    let buckets = app.recommendations().list().expect("list");
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].places.len(), 1);

    // The city landed on the home list exactly once.
    assert_eq!(app.user_places().list().expect("list").len(), 1);
}

#[test]
fn place_identity_is_stable_across_merges_and_toggles() {
    let app = app();
    let bucket = app
        .add_recommendation("Tokyo", text_input("Ichiran"), None)
        .expect("add");
    let id = bucket.places[0].id.clone();

    app.mark_visited(&id, true).expect("visit");
    app.add_recommendation("tokyo", text_input("Ichiran\nAfuri"), None)
        .expect("merge");

    let place = app
        .recommendations()
        .find_place(&id)
        .expect("find")
        .expect("present");
    assert_eq!(place.id, id);
    assert!(place.visited);
}

#[test]
fn visited_propagates_across_two_routes_and_three_days() {
    let app = app();
    let bucket = app
        .add_recommendation("Tokyo", text_input("Ichiran"), None)
        .expect("add");
    let place_id = bucket.places[0].id.clone();

    let routes = app.routes();
    let first = routes
        .create(crate::routes::NewRoute {
            name: "First".to_string(),
            city_id: bucket.city_id.clone(),
            city: "Tokyo".to_string(),
            country: "Japan".to_string(),
            start_date: None,
            end_date: None,
        })
        .expect("create");
    let second = routes
        .create(crate::routes::NewRoute {
            name: "Second".to_string(),
            city_id: bucket.city_id.clone(),
            city: "Tokyo".to_string(),
            country: "Japan".to_string(),
            start_date: None,
            end_date: None,
        })
        .expect("create");
    routes.add_day(&second.id).expect("day 2");
    routes.add_place(&first.id, 1, &place_id).expect("add");
    routes.add_place(&second.id, 1, &place_id).expect("add");
    // The same id cannot appear twice in one route, so the third
    // reference lives on another day of the second route only after
    // removing it from day 1.
    routes.remove_place(&second.id, &place_id).expect("remove");
    routes.add_place(&second.id, 2, &place_id).expect("add");

    app.mark_visited(&place_id, true).expect("visit");
    for route in routes.list().expect("list") {
        for day in &route.days {
            for place_ref in &day.places {
                assert!(place_ref.visited, "route {} day {}", route.name, day.day_number);
            }
        }
    }

    // Toggling back from inside a route restores the source flag.
    app.set_route_place_visited(&second.id, &place_id, false)
        .expect("toggle back");
    let place = app
        .recommendations()
        .find_place(&place_id)
        .expect("find")
        .expect("present");
    assert!(!place.visited);
    let first_reloaded = routes.get(&first.id).expect("get").expect("present");
    assert!(!first_reloaded.days[0].places[0].visited);
}

#[test]
fn trip_side_toggle_writes_through_to_the_recommendation() {
    let app = app();
    let bucket = app
        .add_recommendation("Lisbon", text_input("Time Out Market"), None)
        .expect("add");
    let place_id = bucket.places[0].id.clone();

    let trip = app
        .trips()
        .create(crate::trips::NewTrip {
            name: "City break".to_string(),
            city_id: bucket.city_id.clone(),
            city: "Lisbon".to_string(),
            country: "Portugal".to_string(),
            start_date: None,
            end_date: None,
        })
        .expect("create");
    app.trips().add_place(&trip.id, 1, &place_id).expect("add");

    app.set_trip_place_visited(&trip.id, &place_id, true)
        .expect("toggle");
    let place = app
        .recommendations()
        .find_place(&place_id)
        .expect("find")
        .expect("present");
    assert!(place.visited);
}

#[test]
fn deletion_leaves_dangling_refs_for_lazy_cleanup() {
    let app = app();
    let bucket = app
        .add_recommendation("Tokyo", text_input("Ichiran\nAfuri"), None)
        .expect("add");
    let doomed = bucket.places[0].id.clone();

    let route = app
        .routes()
        .create(crate::routes::NewRoute {
            name: "Weekend".to_string(),
            city_id: bucket.city_id.clone(),
            city: "Tokyo".to_string(),
            country: "Japan".to_string(),
            start_date: None,
            end_date: None,
        })
        .expect("create");
    app.routes().add_place(&route.id, 1, &doomed).expect("add");
    app.routes()
        .add_place(&route.id, 1, &bucket.places[1].id)
        .expect("add");

    app.delete_place(&doomed).expect("delete");

    // The reference dangles until the display path validates it.
    let before = app.routes().get(&route.id).expect("get").expect("present");
    assert_eq!(before.days[0].places.len(), 2);

    assert!(app.validate_route(&route.id).expect("validate"));
    let after = app.routes().get(&route.id).expect("get").expect("present");
    assert_eq!(after.days[0].places.len(), 1);
    assert_eq!(after.days[0].places[0].order, 0);
}

#[test]
fn reconcile_runs_at_most_once_per_session() {
    let app = app();
    assert_eq!(app.reconcile_state(), ReconcileState::Uninitialized);
    assert!(app.reconcile_once().expect("first"));
    assert_eq!(app.reconcile_state(), ReconcileState::Done);
    assert!(!app.reconcile_once().expect("second"));
}

#[test]
fn reconcile_failure_still_finishes_the_session() {
    let app = app_with_remote(FakeRemote {
        offline: true,
        ..FakeRemote::default()
    });
    assert!(app.reconcile_once().expect("pass runs"));
    assert_eq!(app.reconcile_state(), ReconcileState::Done);
    assert!(!app.reconcile_once().expect("no retry"));
}

#[test]
fn reconcile_merges_remote_only_places_local_wins() {
    let remote = FakeRemote::default();
    {
        // Seed the remote with a stale copy of a local place and a new
        // one, as a previous session would have left it.
        let seed_app = app();
        let bucket = seed_app
            .add_recommendation("Tokyo", text_input("Ichiran\nAfuri"), None)
            .expect("add");
        let mut docs: Vec<PlaceDoc> = bucket
            .places
            .iter()
            .map(|place| PlaceDoc::from_place(place, &bucket, "user-1"))
            .collect();
        docs[0].visited = false;
        remote.upsert_places(&docs).expect("seed");
    }

    let app = app_with_remote(remote);
    let bucket = app
        .add_recommendation("Tokyo", text_input("Ichiran"), None)
        .expect("add");
    let local_id = bucket.places[0].id.clone();
    app.mark_visited(&local_id, true).expect("visit");

    app.reconcile_once().expect("reconcile");

    let buckets = app.recommendations().list().expect("list");
    assert_eq!(buckets.len(), 1);
    // The remote-only place was added; the local place kept its state.
    assert_eq!(buckets[0].places.len(), 3);
    let local = buckets[0].find_place(&local_id).expect("kept");
    assert!(local.visited);
}
