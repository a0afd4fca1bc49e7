use uuid::Uuid;

use crate::app::AppError;
use crate::domain::place::{Place, PlaceContext, PlaceId, Source};
use crate::domain::recommendation::{ParsedRecommendation, Recommendation};
use crate::events::{EventBus, StoreEvent};
use crate::images::ImageProvider;
use crate::storage::{Storage, KEY_RECOMMENDATIONS};

/// Fields of a place that can be edited after creation. `None` leaves
/// the current value untouched.
#[derive(Debug, Clone, Default)]
pub struct PlaceMetaPatch {
    pub description: Option<String>,
    pub website: Option<String>,
    pub source: Option<Source>,
    pub context: Option<PlaceContext>,
}

/// City-bucketed recommendations: the primary place store. Merge-on-add
/// keeps exactly one bucket per city and one place per name within it.
pub struct RecommendationStore<'a> {
    storage: &'a Storage,
    bus: &'a EventBus,
    images: &'a dyn ImageProvider,
}

impl<'a> RecommendationStore<'a> {
    pub fn new(storage: &'a Storage, bus: &'a EventBus, images: &'a dyn ImageProvider) -> Self {
        RecommendationStore {
            storage,
            bus,
            images,
        }
    }

    pub fn list(&self) -> Result<Vec<Recommendation>, AppError> {
        Ok(self.storage.load(KEY_RECOMMENDATIONS)?)
    }

    /// Merge a parsed recommendation into the store and return the
    /// resulting bucket. The bucket for the city is resolved
    /// case-insensitively after trimming; places already present by
    /// lowercase name are skipped, categories are unioned, and a
    /// non-empty incoming country overwrites the stored one. Persists
    /// before emitting `recommendationAdded`.
    pub fn store(&self, parsed: ParsedRecommendation) -> Result<Recommendation, AppError> {
        let city = parsed.city.trim();
        if city.is_empty() {
            return Err(AppError::Validation("city name is required".to_string()));
        }
        if let Some(place) = parsed.places.iter().find(|place| place.name.trim().is_empty()) {
            return Err(AppError::Validation(format!(
                "place '{}' has an empty name",
                place.id
            )));
        }

        let mut buckets: Vec<Recommendation> = self.storage.load(KEY_RECOMMENDATIONS)?;
        let existing = buckets.iter().position(|bucket| bucket.matches_city(city));

        let mut incoming = parsed.places;
        for place in &mut incoming {
            if place.image.is_none() {
                place.image = Some(self.images.image_for(&place.name, &place.category));
            }
        }

        let index = match existing {
            Some(index) => index,
            None => {
                buckets.push(Recommendation {
                    id: parsed.id.clone(),
                    city_id: parsed
                        .city_id
                        .clone()
                        .unwrap_or_else(|| Uuid::now_v7().to_string()),
                    city: city.to_string(),
                    country: None,
                    categories: Vec::new(),
                    places: Vec::new(),
                    date_added: parsed.date_added.clone(),
                });
                buckets.len() - 1
            }
        };

        let bucket = &mut buckets[index];
        for place in incoming {
            if !bucket.contains_place_name(&place.name) {
                bucket.places.push(place);
            }
        }
        for category in &parsed.categories {
            if !bucket.categories.contains(category) {
                bucket.categories.push(category.clone());
            }
        }
        if let Some(country) = parsed.country.as_deref() {
            if !country.trim().is_empty() {
                bucket.country = Some(country.trim().to_string());
            }
        }

        let merged = bucket.clone();
        self.storage.save(KEY_RECOMMENDATIONS, &buckets)?;
        self.bus.emit(&StoreEvent::RecommendationAdded {
            city_id: merged.city_id.clone(),
        });
        Ok(merged)
    }

    /// Flip the visited flag on the matching place. A miss is a silent
    /// no-op: nothing persists and nothing is emitted.
    pub fn mark_visited(&self, place_id: &PlaceId, visited: bool) -> Result<bool, AppError> {
        let mut buckets: Vec<Recommendation> = self.storage.load(KEY_RECOMMENDATIONS)?;
        let mut matched = false;
        for bucket in &mut buckets {
            if let Some(place) = bucket.find_place_mut(place_id) {
                place.visited = visited;
                matched = true;
            }
        }
        if !matched {
            return Ok(false);
        }
        self.storage.save(KEY_RECOMMENDATIONS, &buckets)?;
        self.bus.emit(&StoreEvent::RecommendationVisited {
            place_id: place_id.clone(),
            visited,
        });
        Ok(true)
    }

    /// Remove the matching place; a bucket left empty is pruned. Does
    /// not cascade into collections, routes or trips; their reads
    /// tolerate and lazily prune dangling references.
    pub fn delete(&self, place_id: &PlaceId) -> Result<bool, AppError> {
        let mut buckets: Vec<Recommendation> = self.storage.load(KEY_RECOMMENDATIONS)?;
        let mut matched = false;
        for bucket in &mut buckets {
            let before = bucket.places.len();
            bucket.places.retain(|place| &place.id != place_id);
            matched |= bucket.places.len() != before;
        }
        if !matched {
            return Ok(false);
        }
        buckets.retain(|bucket| !bucket.places.is_empty());
        self.storage.save(KEY_RECOMMENDATIONS, &buckets)?;
        self.bus.emit(&StoreEvent::RecommendationDeleted {
            place_id: place_id.clone(),
        });
        Ok(true)
    }

    /// Patch editable fields on the matching place. Persists and emits
    /// `recommendationUpdated` only when a place matched.
    pub fn update_meta(&self, place_id: &PlaceId, patch: PlaceMetaPatch) -> Result<bool, AppError> {
        let mut buckets: Vec<Recommendation> = self.storage.load(KEY_RECOMMENDATIONS)?;
        let mut matched_city_id = None;
        for bucket in &mut buckets {
            if let Some(place) = bucket.find_place_mut(place_id) {
                if let Some(description) = patch.description.clone() {
                    place.description = Some(description);
                }
                if let Some(website) = patch.website.clone() {
                    place.website = Some(website);
                }
                if let Some(source) = patch.source.clone() {
                    place.source = Some(source);
                }
                if let Some(context) = patch.context.clone() {
                    place.context = Some(context);
                }
                matched_city_id = Some(bucket.city_id.clone());
            }
        }
        let Some(city_id) = matched_city_id else {
            return Ok(false);
        };
        self.storage.save(KEY_RECOMMENDATIONS, &buckets)?;
        self.bus.emit(&StoreEvent::RecommendationUpdated { city_id });
        Ok(true)
    }

    /// The bucket containing `place_id`, if any. Used when pushing a
    /// single place's bucket to the remote store.
    pub fn bucket_of(&self, place_id: &PlaceId) -> Result<Option<Recommendation>, AppError> {
        let buckets: Vec<Recommendation> = self.storage.load(KEY_RECOMMENDATIONS)?;
        Ok(buckets
            .into_iter()
            .find(|bucket| bucket.find_place(place_id).is_some()))
    }

    /// Look up a place across all buckets.
    pub fn find_place(&self, place_id: &PlaceId) -> Result<Option<Place>, AppError> {
        let buckets: Vec<Recommendation> = self.storage.load(KEY_RECOMMENDATIONS)?;
        Ok(buckets
            .iter()
            .find_map(|bucket| bucket.find_place(place_id).cloned()))
    }
}
