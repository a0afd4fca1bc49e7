use serde::{Deserialize, Serialize};

use super::place::PlaceId;
use super::route::{percentage, RouteProgress};

/// Day start, visit length and default hop, all in minutes.
const DAY_START_MINUTES: u32 = 9 * 60;
const VISIT_MINUTES: u32 = 45;
const DEFAULT_TRAVEL_MINUTES: u32 = 15;
const DAY_CAP_MINUTES: u32 = 23 * 60;

/// A day-partitioned itinerary with derived visit times. Same shape as
/// a route, with 1-based ordering and schedule derivation on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub name: String,
    pub city_id: String,
    pub city: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub days: Vec<TripDay>,
    pub date_created: String,
    pub date_modified: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripDay {
    pub day_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub places: Vec<TripPlaceRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPlaceRef {
    pub place_id: PlaceId,
    pub order: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub visited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_time_slot: Option<TimeSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_to_next_minutes: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    Morning,
    Lunch,
    Afternoon,
    Evening,
    Night,
}

impl TimeSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Lunch => "lunch",
            TimeSlot::Afternoon => "afternoon",
            TimeSlot::Evening => "evening",
            TimeSlot::Night => "night",
        }
    }

    fn from_minutes(minutes: u32) -> TimeSlot {
        match minutes / 60 {
            0..=11 => TimeSlot::Morning,
            12..=13 => TimeSlot::Lunch,
            14..=17 => TimeSlot::Afternoon,
            18..=20 => TimeSlot::Evening,
            _ => TimeSlot::Night,
        }
    }
}

impl Trip {
    pub fn find_day(&self, day_number: u32) -> Option<&TripDay> {
        self.days.iter().find(|day| day.day_number == day_number)
    }

    pub fn find_day_mut(&mut self, day_number: u32) -> Option<&mut TripDay> {
        self.days.iter_mut().find(|day| day.day_number == day_number)
    }

    pub fn contains_place(&self, place_id: &PlaceId) -> bool {
        self.days
            .iter()
            .any(|day| day.places.iter().any(|place| &place.place_id == place_id))
    }

    pub fn progress(&self) -> RouteProgress {
        let total: usize = self.days.iter().map(|day| day.places.len()).sum();
        let visited: usize = self
            .days
            .iter()
            .map(|day| day.places.iter().filter(|place| place.visited).count())
            .sum();
        RouteProgress {
            total_places: total,
            visited_places: visited,
            progress_percentage: percentage(visited, total),
        }
    }
}

/// Rewrite 1-based order and derive `suggested_time`/`suggested_time_slot`
/// for a day's places. Deterministic over position: the walk starts at
/// 09:00, each stop takes 45 minutes plus the reference's travel
/// estimate (15 minutes when absent), and the running clock caps at
/// 23:00 so a long day never spills into the next one.
pub fn reschedule_day(places: &mut [TripPlaceRef]) {
    let mut clock = DAY_START_MINUTES;
    for (index, place) in places.iter_mut().enumerate() {
        place.order = index + 1;
        place.suggested_time = Some(format!("{:02}:{:02}", clock / 60, clock % 60));
        place.suggested_time_slot = Some(TimeSlot::from_minutes(clock));

        let travel = place.travel_to_next_minutes.unwrap_or(DEFAULT_TRAVEL_MINUTES);
        clock = (clock + VISIT_MINUTES + travel).min(DAY_CAP_MINUTES);
    }
}

#[cfg(test)]
mod tests {
    use super::{reschedule_day, TimeSlot, TripPlaceRef};
    use crate::domain::place::PlaceId;

    fn trip_ref(id: &str) -> TripPlaceRef {
        TripPlaceRef {
            place_id: PlaceId::from(id),
            order: 0,
            notes: None,
            visited: false,
            suggested_time: None,
            suggested_time_slot: None,
            travel_to_next_minutes: None,
        }
    }

    #[test]
    fn schedules_from_nine_with_default_hops() {
        let mut places = vec![trip_ref("a"), trip_ref("b"), trip_ref("c")];
        reschedule_day(&mut places);

        assert_eq!(places[0].order, 1);
        assert_eq!(places[0].suggested_time.as_deref(), Some("09:00"));
        assert_eq!(places[0].suggested_time_slot, Some(TimeSlot::Morning));
        assert_eq!(places[1].suggested_time.as_deref(), Some("10:00"));
        assert_eq!(places[2].suggested_time.as_deref(), Some("11:00"));
        assert_eq!(places[2].order, 3);
    }

    #[test]
    fn honors_explicit_travel_estimates() {
        let mut places = vec![trip_ref("a"), trip_ref("b")];
        places[0].travel_to_next_minutes = Some(60);
        reschedule_day(&mut places);
        assert_eq!(places[1].suggested_time.as_deref(), Some("10:45"));
    }

    #[test]
    fn clock_caps_at_twenty_three() {
        let mut places: Vec<TripPlaceRef> =
            (0..20).map(|i| trip_ref(&format!("p{i}"))).collect();
        reschedule_day(&mut places);
        let last = places.last().expect("non-empty");
        assert_eq!(last.suggested_time.as_deref(), Some("23:00"));
        assert_eq!(last.suggested_time_slot, Some(TimeSlot::Night));
    }

    #[test]
    fn slot_boundaries_match_hours() {
        assert_eq!(TimeSlot::from_minutes(11 * 60 + 59), TimeSlot::Morning);
        assert_eq!(TimeSlot::from_minutes(12 * 60), TimeSlot::Lunch);
        assert_eq!(TimeSlot::from_minutes(14 * 60), TimeSlot::Afternoon);
        assert_eq!(TimeSlot::from_minutes(18 * 60), TimeSlot::Evening);
        assert_eq!(TimeSlot::from_minutes(21 * 60), TimeSlot::Night);
    }
}
