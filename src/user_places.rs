use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppError;
use crate::events::{EventBus, StoreEvent};
use crate::images::city_image;
use crate::storage::{Storage, KEY_USER_PLACES};

/// A city entry on the home screen. Registered automatically when a
/// recommendation is stored for a new city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPlace {
    pub id: String,
    pub name: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

pub struct UserPlaceStore<'a> {
    storage: &'a Storage,
    bus: &'a EventBus,
}

impl<'a> UserPlaceStore<'a> {
    pub fn new(storage: &'a Storage, bus: &'a EventBus) -> Self {
        UserPlaceStore { storage, bus }
    }

    pub fn list(&self) -> Result<Vec<UserPlace>, AppError> {
        Ok(self.storage.load(KEY_USER_PLACES)?)
    }

    /// Register a city, deduplicated by case-insensitive name. An
    /// existing entry only gets its country backfilled (never
    /// overwritten); a fresh entry gets a static city image. Returns
    /// whether the list changed.
    pub fn register(&self, city: &str, country: Option<&str>) -> Result<bool, AppError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(AppError::Validation("city name is required".to_string()));
        }
        let mut places = self.list()?;
        if let Some(existing) = places
            .iter_mut()
            .find(|place| place.name.eq_ignore_ascii_case(city))
        {
            let backfill = match (country, &existing.country) {
                (Some(country), None) if !country.trim().is_empty() => {
                    Some(country.trim().to_string())
                }
                _ => None,
            };
            let Some(country) = backfill else {
                return Ok(false);
            };
            existing.country = Some(country);
        } else {
            places.push(UserPlace {
                id: Uuid::now_v7().to_string(),
                name: city.to_string(),
                image: city_image(city).to_string(),
                country: country
                    .map(str::trim)
                    .filter(|country| !country.is_empty())
                    .map(str::to_string),
            });
        }
        self.storage.save(KEY_USER_PLACES, &places)?;
        self.bus.emit(&StoreEvent::UserPlacesChanged);
        Ok(true)
    }

    pub fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut places = self.list()?;
        let before = places.len();
        places.retain(|place| place.id != id);
        if places.len() == before {
            return Ok(false);
        }
        self.storage.save(KEY_USER_PLACES, &places)?;
        self.bus.emit(&StoreEvent::UserPlacesChanged);
        Ok(true)
    }

    pub fn update_image(&self, id: &str, image_url: &str) -> Result<bool, AppError> {
        let mut places = self.list()?;
        let Some(place) = places.iter_mut().find(|place| place.id == id) else {
            return Ok(false);
        };
        place.image = image_url.to_string();
        self.storage.save(KEY_USER_PLACES, &places)?;
        self.bus.emit(&StoreEvent::UserPlacesChanged);
        Ok(true)
    }
}
