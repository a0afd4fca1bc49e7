use serde::{Deserialize, Serialize};

use super::place::{Place, PlaceId};

/// Per-city container of places. Exactly one bucket exists per city
/// name (case-insensitively, after trimming).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub city_id: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub categories: Vec<String>,
    pub places: Vec<Place>,
    pub date_added: String,
}

impl Recommendation {
    pub fn matches_city(&self, city: &str) -> bool {
        self.city.trim().eq_ignore_ascii_case(city.trim())
    }

    pub fn contains_place_name(&self, name: &str) -> bool {
        self.places
            .iter()
            .any(|place| place.name.eq_ignore_ascii_case(name))
    }

    pub fn find_place(&self, id: &PlaceId) -> Option<&Place> {
        self.places.iter().find(|place| &place.id == id)
    }

    pub fn find_place_mut(&mut self, id: &PlaceId) -> Option<&mut Place> {
        self.places.iter_mut().find(|place| &place.id == id)
    }
}

/// Output of the parsing pipeline: a candidate bucket not yet merged
/// into the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRecommendation {
    pub id: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub categories: Vec<String>,
    pub places: Vec<Place>,
    pub raw_text: String,
    pub date_added: String,
}
