use std::cell::RefCell;

use crate::domain::place::PlaceId;

/// A store mutation notification. Events fire after the mutation has
/// fully persisted, so a subscriber may reload from storage and see the
/// change. Variants without detail fields mean "reload"; detail fields
/// are present only where a subscriber can patch incrementally.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    RecommendationAdded { city_id: String },
    RecommendationDeleted { place_id: PlaceId },
    RecommendationVisited { place_id: PlaceId, visited: bool },
    RecommendationUpdated { city_id: String },
    CollectionUpdated { collection_id: String },
    RouteCreated { route_id: String },
    /// `route_id: None` means more than one route changed in a single
    /// mutation; subscribers must reload all routes.
    RouteUpdated { route_id: Option<String> },
    RouteDeleted { route_id: String },
    TripCreated { trip_id: String },
    TripUpdated { trip_id: Option<String> },
    TripDeleted { trip_id: String },
    UserPlacesChanged,
    ProximitySettingsChanged,
}

impl StoreEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreEvent::RecommendationAdded { .. } => "recommendationAdded",
            StoreEvent::RecommendationDeleted { .. } => "recommendationDeleted",
            StoreEvent::RecommendationVisited { .. } => "recommendationVisited",
            StoreEvent::RecommendationUpdated { .. } => "recommendationUpdated",
            StoreEvent::CollectionUpdated { .. } => "collectionUpdated",
            StoreEvent::RouteCreated { .. } => "routeCreated",
            StoreEvent::RouteUpdated { .. } => "routeUpdated",
            StoreEvent::RouteDeleted { .. } => "routeDeleted",
            StoreEvent::TripCreated { .. } => "tripCreated",
            StoreEvent::TripUpdated { .. } => "tripUpdated",
            StoreEvent::TripDeleted { .. } => "tripDeleted",
            StoreEvent::UserPlacesChanged => "userPlacesChanged",
            StoreEvent::ProximitySettingsChanged => "proximitySettingsChanged",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(u64);

type Subscriber = Box<dyn Fn(&StoreEvent)>;

/// In-process publish/subscribe bus. Single-threaded by construction:
/// subscribers run synchronously on the emitting call stack, after the
/// store has persisted.
#[derive(Default)]
pub struct EventBus {
    subscribers: RefCell<Vec<(SubscriberId, Subscriber)>>,
    next_id: std::cell::Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus::default()
    }

    pub fn subscribe(&self, subscriber: impl Fn(&StoreEvent) + 'static) -> SubscriberId {
        let id = SubscriberId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.subscribers
            .borrow_mut()
            .push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers
            .borrow_mut()
            .retain(|(existing, _)| *existing != id);
    }

    pub fn emit(&self, event: &StoreEvent) {
        log::debug!("event {}", event.kind());
        // Subscribers run on the emitting call stack and must not
        // subscribe or unsubscribe while handling an event.
        let subscribers = self.subscribers.borrow();
        for (_, subscriber) in subscribers.iter() {
            subscriber(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{EventBus, StoreEvent};

    #[test]
    fn emits_to_all_subscribers_in_order() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&seen);
        bus.subscribe(move |event| first.borrow_mut().push(format!("a:{}", event.kind())));
        let second = Rc::clone(&seen);
        bus.subscribe(move |event| second.borrow_mut().push(format!("b:{}", event.kind())));

        bus.emit(&StoreEvent::UserPlacesChanged);
        assert_eq!(
            *seen.borrow(),
            vec!["a:userPlacesChanged".to_string(), "b:userPlacesChanged".to_string()]
        );
    }

    #[test]
    fn unsubscribed_closure_stops_receiving() {
        let bus = EventBus::new();
        let count = Rc::new(RefCell::new(0u32));

        let counter = Rc::clone(&count);
        let id = bus.subscribe(move |_| *counter.borrow_mut() += 1);

        bus.emit(&StoreEvent::UserPlacesChanged);
        bus.unsubscribe(id);
        bus.emit(&StoreEvent::UserPlacesChanged);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn kind_strings_match_the_published_names() {
        assert_eq!(
            StoreEvent::RouteUpdated { route_id: None }.kind(),
            "routeUpdated"
        );
        assert_eq!(
            StoreEvent::RecommendationVisited {
                place_id: crate::domain::place::PlaceId::from("p"),
                visited: true
            }
            .kind(),
            "recommendationVisited"
        );
    }
}
