use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use crate::app::AppError;
use crate::domain::place::PlaceId;
use crate::domain::route::{parse_day, PlaceRef, Route, RouteDay, RouteStatus};
use crate::events::{EventBus, StoreEvent};
use crate::storage::{now_utc_rfc3339, Storage, KEY_ROUTES};

#[derive(Debug, Clone)]
pub struct NewRoute {
    pub name: String,
    pub city_id: String,
    pub city: String,
    pub country: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Routes bucketed by derived status, each bucket in its display order.
#[derive(Debug, Default, Serialize)]
pub struct GroupedRoutes {
    pub ongoing: Vec<Route>,
    pub upcoming: Vec<Route>,
    pub completed: Vec<Route>,
    pub past: Vec<Route>,
    pub undated: Vec<Route>,
}

/// Day-partitioned itineraries with dense 0-based ordering per day.
pub struct RouteStore<'a> {
    storage: &'a Storage,
    bus: &'a EventBus,
}

impl<'a> RouteStore<'a> {
    pub fn new(storage: &'a Storage, bus: &'a EventBus) -> Self {
        RouteStore { storage, bus }
    }

    pub fn list(&self) -> Result<Vec<Route>, AppError> {
        Ok(self.storage.load(KEY_ROUTES)?)
    }

    pub fn get(&self, route_id: &str) -> Result<Option<Route>, AppError> {
        Ok(self.list()?.into_iter().find(|route| route.id == route_id))
    }

    /// Create a route with an empty day 1.
    pub fn create(&self, new: NewRoute) -> Result<Route, AppError> {
        let name = new.name.trim();
        let city = new.city.trim();
        if name.is_empty() {
            return Err(AppError::Validation("route name is required".to_string()));
        }
        if city.is_empty() {
            return Err(AppError::Validation("route city is required".to_string()));
        }
        let now = now_utc_rfc3339();
        let route = Route {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            city_id: new.city_id,
            city: city.to_string(),
            country: new.country,
            start_date: new.start_date,
            end_date: new.end_date,
            days: vec![RouteDay {
                day_number: 1,
                date: None,
                label: None,
                places: Vec::new(),
            }],
            date_created: now.clone(),
            date_modified: now,
        };
        let mut routes = self.list()?;
        routes.push(route.clone());
        self.storage.save(KEY_ROUTES, &routes)?;
        self.bus.emit(&StoreEvent::RouteCreated {
            route_id: route.id.clone(),
        });
        Ok(route)
    }

    /// Create a route seeded with a collection's places, in the
    /// collection's display order, all on day 1.
    pub fn create_from_collection(
        &self,
        collection: &crate::domain::collection::Collection,
        new: NewRoute,
    ) -> Result<Route, AppError> {
        let route = self.create(new)?;
        let mut routes = self.list()?;
        let stored = routes
            .iter_mut()
            .find(|candidate| candidate.id == route.id)
            .ok_or_else(|| AppError::NotFound(format!("route '{}'", route.id)))?;
        let day = stored
            .find_day_mut(1)
            .ok_or_else(|| AppError::NotFound("day 1".to_string()))?;
        for (order, place_id) in collection.ordered().iter().enumerate() {
            day.places.push(PlaceRef {
                place_id: place_id.clone(),
                order,
                notes: None,
                visited: false,
            });
        }
        stored.date_modified = now_utc_rfc3339();
        let seeded = stored.clone();
        self.storage.save(KEY_ROUTES, &routes)?;
        self.bus.emit(&StoreEvent::RouteUpdated {
            route_id: Some(route.id.clone()),
        });
        Ok(seeded)
    }

    pub fn delete(&self, route_id: &str) -> Result<bool, AppError> {
        let mut routes = self.list()?;
        let before = routes.len();
        routes.retain(|route| route.id != route_id);
        if routes.len() == before {
            return Ok(false);
        }
        self.storage.save(KEY_ROUTES, &routes)?;
        self.bus.emit(&StoreEvent::RouteDeleted {
            route_id: route_id.to_string(),
        });
        Ok(true)
    }

    pub fn add_day(&self, route_id: &str) -> Result<u32, AppError> {
        let mut added = 0;
        self.mutate(route_id, |route| {
            let next = route
                .days
                .iter()
                .map(|day| day.day_number)
                .max()
                .unwrap_or(0)
                + 1;
            route.days.push(RouteDay {
                day_number: next,
                date: None,
                label: None,
                places: Vec::new(),
            });
            added = next;
            true
        })?;
        if added == 0 {
            return Err(AppError::NotFound(format!("route '{}'", route_id)));
        }
        Ok(added)
    }

    /// Remove a day only when it holds no places.
    pub fn remove_day(&self, route_id: &str, day_number: u32) -> Result<bool, AppError> {
        self.mutate(route_id, |route| {
            match route.find_day(day_number) {
                Some(day) if day.places.is_empty() => {}
                _ => return false,
            }
            route.days.retain(|day| day.day_number != day_number);
            true
        })
    }

    /// Append a place to a day. Returns false (no-op, no event) when
    /// the place is already on any day of the route; a day that does
    /// not exist is an error, not a no-op.
    pub fn add_place(
        &self,
        route_id: &str,
        day_number: u32,
        place_id: &PlaceId,
    ) -> Result<bool, AppError> {
        let mut missing_day = false;
        let added = self.mutate(route_id, |route| {
            if route.find_day(day_number).is_none() {
                missing_day = true;
                return false;
            }
            if route.contains_place(place_id) {
                return false;
            }
            let Some(day) = route.find_day_mut(day_number) else {
                return false;
            };
            let order = day.places.len();
            day.places.push(PlaceRef {
                place_id: place_id.clone(),
                order,
                notes: None,
                visited: false,
            });
            true
        })?;
        if missing_day {
            return Err(AppError::NotFound(format!(
                "day {} of route '{}'",
                day_number, route_id
            )));
        }
        Ok(added)
    }

    /// Remove a place from whichever day holds it, renumbering that
    /// day densely from 0.
    pub fn remove_place(&self, route_id: &str, place_id: &PlaceId) -> Result<bool, AppError> {
        self.mutate(route_id, |route| {
            let mut removed = false;
            for day in &mut route.days {
                let before = day.places.len();
                day.places.retain(|place| &place.place_id != place_id);
                if day.places.len() != before {
                    renumber(&mut day.places);
                    removed = true;
                }
            }
            removed
        })
    }

    /// Replace a day's sequence wholesale; every `order` is rewritten
    /// to its index. A place id repeated in the new sequence keeps only
    /// its first occurrence, so a place still appears at most once.
    pub fn reorder(
        &self,
        route_id: &str,
        day_number: u32,
        ordered: Vec<PlaceRef>,
    ) -> Result<bool, AppError> {
        self.mutate(route_id, |route| {
            let Some(day) = route.find_day_mut(day_number) else {
                return false;
            };
            let mut unique: Vec<PlaceRef> = Vec::with_capacity(ordered.len());
            for place in &ordered {
                if !unique.iter().any(|kept| kept.place_id == place.place_id) {
                    unique.push(place.clone());
                }
            }
            day.places = unique;
            renumber(&mut day.places);
            true
        })
    }

    /// Flip a reference's visited flag wherever it appears in the
    /// route. Recommendation-side write-through is the caller's job.
    pub fn set_visited(
        &self,
        route_id: &str,
        place_id: &PlaceId,
        visited: bool,
    ) -> Result<bool, AppError> {
        self.mutate(route_id, |route| {
            let mut matched = false;
            for day in &mut route.days {
                for place in &mut day.places {
                    if &place.place_id == place_id {
                        place.visited = visited;
                        matched = true;
                    }
                }
            }
            matched
        })
    }

    pub fn update_day(
        &self,
        route_id: &str,
        day_number: u32,
        label: Option<String>,
        date: Option<String>,
    ) -> Result<bool, AppError> {
        self.mutate(route_id, |route| {
            let Some(day) = route.find_day_mut(day_number) else {
                return false;
            };
            if let Some(label) = label.clone() {
                day.label = Some(label);
            }
            if let Some(date) = date.clone() {
                day.date = Some(date);
            }
            true
        })
    }

    /// Align every reference to `place_id` across all routes with the
    /// given visited value. One batch write, one `routeUpdated` event
    /// with no route detail, regardless of how many routes changed.
    pub fn propagate_visited(&self, place_id: &PlaceId, visited: bool) -> Result<u32, AppError> {
        let mut routes = self.list()?;
        let mut updated = 0u32;
        for route in &mut routes {
            let mut touched = false;
            for day in &mut route.days {
                for place in &mut day.places {
                    if &place.place_id == place_id && place.visited != visited {
                        place.visited = visited;
                        updated += 1;
                        touched = true;
                    }
                }
            }
            if touched {
                route.date_modified = now_utc_rfc3339();
            }
        }
        if updated == 0 {
            return Ok(0);
        }
        self.storage.save(KEY_ROUTES, &routes)?;
        self.bus.emit(&StoreEvent::RouteUpdated { route_id: None });
        Ok(updated)
    }

    /// Drop references to places that no longer exist. The lazy half
    /// of the no-cascade deletion policy; invoked on display paths.
    pub fn validate_places(
        &self,
        route_id: &str,
        known: &HashSet<PlaceId>,
    ) -> Result<bool, AppError> {
        self.mutate(route_id, |route| {
            let mut pruned = false;
            for day in &mut route.days {
                let before = day.places.len();
                day.places.retain(|place| known.contains(&place.place_id));
                if day.places.len() != before {
                    renumber(&mut day.places);
                    pruned = true;
                }
            }
            pruned
        })
    }

    pub fn by_city(&self, city_id: &str) -> Result<Vec<Route>, AppError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|route| route.city_id == city_id)
            .collect())
    }

    pub fn grouped(&self) -> Result<GroupedRoutes, AppError> {
        let mut grouped = GroupedRoutes::default();
        for route in self.list()? {
            match route.status() {
                RouteStatus::Ongoing => grouped.ongoing.push(route),
                RouteStatus::Upcoming => grouped.upcoming.push(route),
                RouteStatus::Completed => grouped.completed.push(route),
                RouteStatus::Past => grouped.past.push(route),
                RouteStatus::Undated => grouped.undated.push(route),
            }
        }
        let by_start = |route: &Route| route.start_date.as_deref().and_then(parse_day);
        grouped.ongoing.sort_by_key(by_start);
        grouped.upcoming.sort_by_key(by_start);
        grouped
            .completed
            .sort_by(|a, b| b.date_modified.cmp(&a.date_modified));
        grouped.past.sort_by(|a, b| {
            let a_end = a.end_date.as_deref().and_then(parse_day);
            let b_end = b.end_date.as_deref().and_then(parse_day);
            b_end.cmp(&a_end)
        });
        grouped
            .undated
            .sort_by(|a, b| b.date_created.cmp(&a.date_created));
        Ok(grouped)
    }

    fn mutate(
        &self,
        route_id: &str,
        mut apply: impl FnMut(&mut Route) -> bool,
    ) -> Result<bool, AppError> {
        let mut routes = self.list()?;
        let Some(route) = routes.iter_mut().find(|route| route.id == route_id) else {
            return Ok(false);
        };
        if !apply(route) {
            return Ok(false);
        }
        route.date_modified = now_utc_rfc3339();
        self.storage.save(KEY_ROUTES, &routes)?;
        self.bus.emit(&StoreEvent::RouteUpdated {
            route_id: Some(route_id.to_string()),
        });
        Ok(true)
    }
}

fn renumber(places: &mut [PlaceRef]) {
    for (index, place) in places.iter_mut().enumerate() {
        place.order = index;
    }
}

#[cfg(test)]
mod tests;
