use serde::Serialize;

use crate::domain::place::Place;
use crate::domain::recommendation::Recommendation;

/// A flattened, per-city view of places for display, filtered by
/// category and country.
#[derive(Debug, Clone, Serialize)]
pub struct CityGroup {
    pub city_id: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub items: Vec<CityGroupItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CityGroupItem {
    #[serde(flatten)]
    pub place: Place,
    pub city: String,
    pub date_added: String,
}

/// Filter criteria; empty categories means "all".
#[derive(Debug, Default, Clone)]
pub struct PlaceFilter {
    pub categories: Vec<String>,
    pub country: Option<String>,
}

impl PlaceFilter {
    fn matches_category(&self, category: &str) -> bool {
        if self.categories.is_empty() {
            return true;
        }
        self.categories
            .iter()
            .any(|wanted| wanted.trim().eq_ignore_ascii_case(category.trim()))
    }

    fn matches_country(&self, country: Option<&str>) -> bool {
        match &self.country {
            None => true,
            Some(wanted) => country
                .map(|country| country.eq_ignore_ascii_case(wanted))
                .unwrap_or(false),
        }
    }
}

/// Group matching places by city. Within a group, unvisited places come
/// first, then newest bucket first.
pub fn filtered_groups(recommendations: &[Recommendation], filter: &PlaceFilter) -> Vec<CityGroup> {
    let mut groups: Vec<CityGroup> = Vec::new();
    for bucket in recommendations {
        if !filter.matches_country(bucket.country.as_deref()) {
            continue;
        }
        let items: Vec<CityGroupItem> = bucket
            .places
            .iter()
            .filter(|place| filter.matches_category(&place.category))
            .map(|place| CityGroupItem {
                place: place.clone(),
                city: bucket.city.clone(),
                date_added: bucket.date_added.clone(),
            })
            .collect();
        if items.is_empty() {
            continue;
        }
        match groups.iter_mut().find(|group| group.city_id == bucket.city_id) {
            Some(group) => group.items.extend(items),
            None => groups.push(CityGroup {
                city_id: bucket.city_id.clone(),
                city: bucket.city.clone(),
                country: bucket.country.clone(),
                items,
            }),
        }
    }
    for group in &mut groups {
        group.items.sort_by(|a, b| {
            a.place
                .visited
                .cmp(&b.place.visited)
                .then_with(|| b.date_added.cmp(&a.date_added))
        });
    }
    groups
}
