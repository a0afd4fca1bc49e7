use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime};

use super::place::PlaceId;

/// A day-partitioned itinerary of place references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub name: String,
    pub city_id: String,
    pub city: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub days: Vec<RouteDay>,
    pub date_created: String,
    pub date_modified: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDay {
    pub day_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub places: Vec<PlaceRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRef {
    pub place_id: PlaceId,
    pub order: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub visited: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteStatus {
    Ongoing,
    Completed,
    Upcoming,
    Past,
    Undated,
}

impl RouteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RouteStatus::Ongoing => "ongoing",
            RouteStatus::Completed => "completed",
            RouteStatus::Upcoming => "upcoming",
            RouteStatus::Past => "past",
            RouteStatus::Undated => "undated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteProgress {
    pub total_places: usize,
    pub visited_places: usize,
    pub progress_percentage: u8,
}

impl Route {
    pub fn find_day(&self, day_number: u32) -> Option<&RouteDay> {
        self.days.iter().find(|day| day.day_number == day_number)
    }

    pub fn find_day_mut(&mut self, day_number: u32) -> Option<&mut RouteDay> {
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

    /// Derived display status. Full completion wins over dates; dates
    /// compare at day granularity.
    pub fn status_on(&self, today: Date) -> RouteStatus {
        let progress = self.progress();
        if progress.total_places > 0 && progress.progress_percentage == 100 {
            return RouteStatus::Completed;
        }

        let start = self.start_date.as_deref().and_then(parse_day);
        let end = self.end_date.as_deref().and_then(parse_day);

        if start.is_none() && end.is_none() {
            return RouteStatus::Undated;
        }
        if let Some(end) = end {
            if end < today {
                return RouteStatus::Past;
            }
        }
        if let Some(start) = start {
            if start > today {
                return RouteStatus::Upcoming;
            }
            match end {
                Some(end) if start <= today && today <= end => return RouteStatus::Ongoing,
                Some(_) => {}
                // Only a start date, and it is today or earlier.
                None => return RouteStatus::Ongoing,
            }
        }
        RouteStatus::Undated
    }

    pub fn status(&self) -> RouteStatus {
        self.status_on(OffsetDateTime::now_utc().date())
    }
}

pub fn percentage(visited: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((visited as f64 / total as f64) * 100.0).round() as u8
}

/// Parse the calendar-day prefix (`YYYY-MM-DD`) of a stored date
/// string; anything after the first ten characters is ignored.
pub fn parse_day(raw: &str) -> Option<Date> {
    let prefix = raw.get(..10)?;
    let mut parts = prefix.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}
