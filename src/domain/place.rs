use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a place. Assigned exactly once, at parse time,
/// and used by every other entity (collections, routes, trips, remote
/// documents) to reference the place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(String);

impl PlaceId {
    pub fn generate() -> Self {
        PlaceId(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PlaceId {
    fn from(value: String) -> Self {
        PlaceId(value)
    }
}

impl From<&str> for PlaceId {
    fn from(value: &str) -> Self {
        PlaceId(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Friend,
    Instagram,
    Blog,
    Email,
    Text,
    Tiktok,
    Youtube,
    Article,
    Ai,
    Other,
}

/// Where a recommendation came from ("Sarah said...", an Instagram
/// reel, a blog post).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub kind: SourceKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitPriority {
    High,
    Medium,
    Low,
}

/// User-supplied context attached to a place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_tip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub occasion_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_priority: Option<VisitPriority>,
}

/// A single point of interest inside a city bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub visited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<PlaceContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl Place {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Place {
            id: PlaceId::generate(),
            name: name.into(),
            category: category.into(),
            description: None,
            image: None,
            visited: false,
            website: None,
            source: None,
            context: None,
            lat: None,
            lng: None,
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.lat.is_some() && self.lng.is_some()
    }
}

/// Normalize a category to fixed casing: first letter upper, rest lower.
/// Empty input falls back to the default category.
pub fn normalize_category(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_CATEGORY.to_string();
    }
    let mut chars = trimmed.chars();
    let first = chars.next().expect("non-empty after trim");
    format!(
        "{}{}",
        first.to_uppercase(),
        chars.as_str().to_lowercase()
    )
}

/// Title-case every word; used for names recovered from verb phrases.
pub fn title_case_words(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub const DEFAULT_CATEGORY: &str = "General";

#[cfg(test)]
mod tests {
    use super::{normalize_category, title_case_words, Place, PlaceId};

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(PlaceId::generate(), PlaceId::generate());
    }

    #[test]
    fn normalizes_category_casing() {
        assert_eq!(normalize_category("food"), "Food");
        assert_eq!(normalize_category("NIGHTLIFE"), "Nightlife");
        assert_eq!(normalize_category("  coffee "), "Coffee");
        assert_eq!(normalize_category(""), "General");
    }

    #[test]
    fn title_cases_each_word() {
        assert_eq!(title_case_words("le petit cafe"), "Le Petit Cafe");
    }

    #[test]
    fn new_place_starts_unvisited() {
        let place = Place::new("Ichiran", "Food");
        assert!(!place.visited);
        assert!(place.image.is_none());
    }
}
