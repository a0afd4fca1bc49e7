use serde::Serialize;
use uuid::Uuid;

use crate::app::AppError;
use crate::domain::place::PlaceId;
use crate::domain::route::RouteProgress;
use crate::domain::trip::{reschedule_day, Trip, TripDay, TripPlaceRef};
use crate::events::{EventBus, StoreEvent};
use crate::storage::{now_utc_rfc3339, Storage, KEY_TRIPS};

#[derive(Debug, Clone)]
pub struct NewTrip {
    pub name: String,
    pub city_id: String,
    pub city: String,
    pub country: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TripWithProgress {
    #[serde(flatten)]
    pub trip: Trip,
    pub progress: RouteProgress,
}

/// Trips mirror routes with 1-based ordering and derived visit times:
/// any mutation of a day's sequence reschedules that day.
pub struct TripStore<'a> {
    storage: &'a Storage,
    bus: &'a EventBus,
}

impl<'a> TripStore<'a> {
    pub fn new(storage: &'a Storage, bus: &'a EventBus) -> Self {
        TripStore { storage, bus }
    }

    pub fn list(&self) -> Result<Vec<Trip>, AppError> {
        Ok(self.storage.load(KEY_TRIPS)?)
    }

    pub fn list_with_progress(&self) -> Result<Vec<TripWithProgress>, AppError> {
        Ok(self
            .list()?
            .into_iter()
            .map(|trip| TripWithProgress {
                progress: trip.progress(),
                trip,
            })
            .collect())
    }

    pub fn get(&self, trip_id: &str) -> Result<Option<Trip>, AppError> {
        Ok(self.list()?.into_iter().find(|trip| trip.id == trip_id))
    }

    pub fn create(&self, new: NewTrip) -> Result<Trip, AppError> {
        let name = new.name.trim();
        let city = new.city.trim();
        if name.is_empty() {
            return Err(AppError::Validation("trip name is required".to_string()));
        }
        if city.is_empty() {
            return Err(AppError::Validation("trip city is required".to_string()));
        }
        let now = now_utc_rfc3339();
        let trip = Trip {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            city_id: new.city_id,
            city: city.to_string(),
            country: new.country,
            start_date: new.start_date,
            end_date: new.end_date,
            days: vec![TripDay {
                day_number: 1,
                date: None,
                label: None,
                theme: None,
                places: Vec::new(),
            }],
            date_created: now.clone(),
            date_modified: now,
        };
        let mut trips = self.list()?;
        trips.push(trip.clone());
        self.storage.save(KEY_TRIPS, &trips)?;
        self.bus.emit(&StoreEvent::TripCreated {
            trip_id: trip.id.clone(),
        });
        Ok(trip)
    }

    pub fn delete(&self, trip_id: &str) -> Result<bool, AppError> {
        let mut trips = self.list()?;
        let before = trips.len();
        trips.retain(|trip| trip.id != trip_id);
        if trips.len() == before {
            return Ok(false);
        }
        self.storage.save(KEY_TRIPS, &trips)?;
        self.bus.emit(&StoreEvent::TripDeleted {
            trip_id: trip_id.to_string(),
        });
        Ok(true)
    }

    pub fn add_day(&self, trip_id: &str) -> Result<u32, AppError> {
        let mut added = 0;
        self.mutate(trip_id, |trip| {
            let next = trip.days.len() as u32 + 1;
            trip.days.push(TripDay {
                day_number: next,
                date: None,
                label: None,
                theme: None,
                places: Vec::new(),
            });
            added = next;
            true
        })?;
        if added == 0 {
            return Err(AppError::NotFound(format!("trip '{}'", trip_id)));
        }
        Ok(added)
    }

    /// Remove an empty day and renumber the remaining days 1-based.
    pub fn remove_day(&self, trip_id: &str, day_number: u32) -> Result<bool, AppError> {
        self.mutate(trip_id, |trip| {
            match trip.find_day(day_number) {
                Some(day) if day.places.is_empty() => {}
                _ => return false,
            }
            trip.days.retain(|day| day.day_number != day_number);
            for (index, day) in trip.days.iter_mut().enumerate() {
                day.day_number = index as u32 + 1;
            }
            true
        })
    }

    /// Append a place to a day and reschedule it. Returns false when
    /// the place is already on any day of the trip; a day that does
    /// not exist is an error, not a no-op.
    pub fn add_place(
        &self,
        trip_id: &str,
        day_number: u32,
        place_id: &PlaceId,
    ) -> Result<bool, AppError> {
        let mut missing_day = false;
        let added = self.mutate(trip_id, |trip| {
            if trip.find_day(day_number).is_none() {
                missing_day = true;
                return false;
            }
            if trip.contains_place(place_id) {
                return false;
            }
            let Some(day) = trip.find_day_mut(day_number) else {
                return false;
            };
            day.places.push(TripPlaceRef {
                place_id: place_id.clone(),
                order: 0,
                notes: None,
                visited: false,
                suggested_time: None,
                suggested_time_slot: None,
                travel_to_next_minutes: None,
            });
            reschedule_day(&mut day.places);
            true
        })?;
        if missing_day {
            return Err(AppError::NotFound(format!(
                "day {} of trip '{}'",
                day_number, trip_id
            )));
        }
        Ok(added)
    }

    pub fn remove_place(&self, trip_id: &str, place_id: &PlaceId) -> Result<bool, AppError> {
        self.mutate(trip_id, |trip| {
            let mut removed = false;
            for day in &mut trip.days {
                let before = day.places.len();
                day.places.retain(|place| &place.place_id != place_id);
                if day.places.len() != before {
                    reschedule_day(&mut day.places);
                    removed = true;
                }
            }
            removed
        })
    }

    /// A place id repeated in the new sequence keeps only its first
    /// occurrence, so a place still appears at most once.
    pub fn reorder(
        &self,
        trip_id: &str,
        day_number: u32,
        ordered: Vec<TripPlaceRef>,
    ) -> Result<bool, AppError> {
        self.mutate(trip_id, |trip| {
            let Some(day) = trip.find_day_mut(day_number) else {
                return false;
            };
            let mut unique: Vec<TripPlaceRef> = Vec::with_capacity(ordered.len());
            for place in &ordered {
                if !unique.iter().any(|kept| kept.place_id == place.place_id) {
                    unique.push(place.clone());
                }
            }
            day.places = unique;
            reschedule_day(&mut day.places);
            true
        })
    }

    /// Move a place between days, rescheduling both.
    pub fn move_place(
        &self,
        trip_id: &str,
        from_day: u32,
        to_day: u32,
        place_id: &PlaceId,
    ) -> Result<bool, AppError> {
        if from_day == to_day {
            return Ok(false);
        }
        self.mutate(trip_id, |trip| {
            if trip.find_day(to_day).is_none() {
                return false;
            }
            let Some(source) = trip.find_day_mut(from_day) else {
                return false;
            };
            let Some(position) = source
                .places
                .iter()
                .position(|place| &place.place_id == place_id)
            else {
                return false;
            };
            let moved = source.places.remove(position);
            reschedule_day(&mut source.places);

            let target = trip
                .find_day_mut(to_day)
                .expect("target day checked above");
            target.places.push(moved);
            reschedule_day(&mut target.places);
            true
        })
    }

    pub fn set_visited(
        &self,
        trip_id: &str,
        place_id: &PlaceId,
        visited: bool,
    ) -> Result<bool, AppError> {
        self.mutate(trip_id, |trip| {
            let mut matched = false;
            for day in &mut trip.days {
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
        trip_id: &str,
        day_number: u32,
        label: Option<String>,
        date: Option<String>,
        theme: Option<String>,
    ) -> Result<bool, AppError> {
        self.mutate(trip_id, |trip| {
            let Some(day) = trip.find_day_mut(day_number) else {
                return false;
            };
            if let Some(label) = label.clone() {
                day.label = Some(label);
            }
            if let Some(date) = date.clone() {
                day.date = Some(date);
            }
            if let Some(theme) = theme.clone() {
                day.theme = Some(theme);
            }
            true
        })
    }

    /// Same contract as the route-side propagation: one batch write,
    /// one `tripUpdated` event without trip detail.
    pub fn propagate_visited(&self, place_id: &PlaceId, visited: bool) -> Result<u32, AppError> {
        let mut trips = self.list()?;
        let mut updated = 0u32;
        for trip in &mut trips {
            let mut touched = false;
            for day in &mut trip.days {
                for place in &mut day.places {
                    if &place.place_id == place_id && place.visited != visited {
                        place.visited = visited;
                        updated += 1;
                        touched = true;
                    }
                }
            }
            if touched {
                trip.date_modified = now_utc_rfc3339();
            }
        }
        if updated == 0 {
            return Ok(0);
        }
        self.storage.save(KEY_TRIPS, &trips)?;
        self.bus.emit(&StoreEvent::TripUpdated { trip_id: None });
        Ok(updated)
    }

    fn mutate(
        &self,
        trip_id: &str,
        mut apply: impl FnMut(&mut Trip) -> bool,
    ) -> Result<bool, AppError> {
        let mut trips = self.list()?;
        let Some(trip) = trips.iter_mut().find(|trip| trip.id == trip_id) else {
            return Ok(false);
        };
        if !apply(trip) {
            return Ok(false);
        }
        trip.date_modified = now_utc_rfc3339();
        self.storage.save(KEY_TRIPS, &trips)?;
        self.bus.emit(&StoreEvent::TripUpdated {
            trip_id: Some(trip_id.to_string()),
        });
        Ok(true)
    }
}
