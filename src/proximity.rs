use serde::{Deserialize, Serialize};

use crate::app::AppError;
use crate::domain::place::PlaceId;
use crate::domain::recommendation::Recommendation;
use crate::events::{EventBus, StoreEvent};
use crate::storage::{Storage, KEY_PROXIMITY_SETTINGS};

pub const MIN_DISTANCE_METERS: u32 = 100;
pub const MAX_DISTANCE_METERS: u32 = 2000;
pub const DEFAULT_DISTANCE_METERS: u32 = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximitySettings {
    pub enabled: bool,
    pub distance_meters: u32,
    pub enabled_city_ids: Vec<String>,
    pub notified_place_ids: Vec<PlaceId>,
}

impl Default for ProximitySettings {
    fn default() -> Self {
        ProximitySettings {
            enabled: false,
            distance_meters: DEFAULT_DISTANCE_METERS,
            enabled_city_ids: Vec::new(),
            notified_place_ids: Vec::new(),
        }
    }
}

/// A monitored place with coordinates, flattened out of its bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoredPlace {
    pub place_id: PlaceId,
    pub name: String,
    pub category: String,
    pub city: String,
    pub city_id: String,
    pub lat: f64,
    pub lng: f64,
}

/// A place the caller should notify about: within range and not yet in
/// the notified registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximityHit {
    pub place: MonitoredPlace,
    pub distance_meters: u32,
}

/// Settings and the notified-place registry behind proximity alerts.
/// Position checks are pure distance math; watching the device location
/// and delivering notifications belong to the caller.
pub struct ProximityStore<'a> {
    storage: &'a Storage,
    bus: &'a EventBus,
}

impl<'a> ProximityStore<'a> {
    pub fn new(storage: &'a Storage, bus: &'a EventBus) -> Self {
        ProximityStore { storage, bus }
    }

    /// Settings are stored as a one-element array under the settings
    /// key; missing means defaults.
    pub fn settings(&self) -> Result<ProximitySettings, AppError> {
        let stored: Vec<ProximitySettings> = self.storage.load(KEY_PROXIMITY_SETTINGS)?;
        Ok(stored.into_iter().next().unwrap_or_default())
    }

    /// First-run seeding of the configured alert distance. Settings
    /// that already exist are left alone, and no event fires: nothing
    /// observable changed from the caller's point of view.
    pub fn seed_default_distance(&self, meters: u32) -> Result<(), AppError> {
        let stored: Vec<ProximitySettings> = self.storage.load(KEY_PROXIMITY_SETTINGS)?;
        if !stored.is_empty() {
            return Ok(());
        }
        let settings = ProximitySettings {
            distance_meters: meters.clamp(MIN_DISTANCE_METERS, MAX_DISTANCE_METERS),
            ..ProximitySettings::default()
        };
        self.storage
            .save(KEY_PROXIMITY_SETTINGS, std::slice::from_ref(&settings))?;
        Ok(())
    }

    fn save(&self, settings: &ProximitySettings) -> Result<(), AppError> {
        self.storage
            .save(KEY_PROXIMITY_SETTINGS, std::slice::from_ref(settings))?;
        self.bus.emit(&StoreEvent::ProximitySettingsChanged);
        Ok(())
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), AppError> {
        let mut settings = self.settings()?;
        settings.enabled = enabled;
        self.save(&settings)
    }

    /// Distance is clamped to the supported range rather than rejected.
    pub fn set_distance(&self, meters: u32) -> Result<u32, AppError> {
        let mut settings = self.settings()?;
        settings.distance_meters = meters.clamp(MIN_DISTANCE_METERS, MAX_DISTANCE_METERS);
        let clamped = settings.distance_meters;
        self.save(&settings)?;
        Ok(clamped)
    }

    /// Returns the city's new enabled state.
    pub fn toggle_city(&self, city_id: &str) -> Result<bool, AppError> {
        let mut settings = self.settings()?;
        let enabled = if let Some(index) = settings
            .enabled_city_ids
            .iter()
            .position(|id| id == city_id)
        {
            settings.enabled_city_ids.remove(index);
            false
        } else {
            settings.enabled_city_ids.push(city_id.to_string());
            true
        };
        self.save(&settings)?;
        Ok(enabled)
    }

    pub fn reset_notified(&self) -> Result<(), AppError> {
        let mut settings = self.settings()?;
        settings.notified_place_ids.clear();
        self.save(&settings)
    }

    /// Places worth monitoring under the current settings: every place
    /// with coordinates in an enabled city.
    pub fn monitored_places(
        &self,
        recommendations: &[Recommendation],
    ) -> Result<Vec<MonitoredPlace>, AppError> {
        let settings = self.settings()?;
        if !settings.enabled {
            return Ok(Vec::new());
        }
        let mut monitored = Vec::new();
        for bucket in recommendations {
            if !settings.enabled_city_ids.contains(&bucket.city_id) {
                continue;
            }
            for place in &bucket.places {
                let (Some(lat), Some(lng)) = (place.lat, place.lng) else {
                    continue;
                };
                monitored.push(MonitoredPlace {
                    place_id: place.id.clone(),
                    name: place.name.clone(),
                    category: place.category.clone(),
                    city: bucket.city.clone(),
                    city_id: bucket.city_id.clone(),
                    lat,
                    lng,
                });
            }
        }
        Ok(monitored)
    }

    /// Compare a position against every monitored place. Each place in
    /// range that has not been notified yet yields a hit and enters the
    /// notified registry; the registry persists once per check.
    pub fn check_position(
        &self,
        recommendations: &[Recommendation],
        lat: f64,
        lng: f64,
    ) -> Result<Vec<ProximityHit>, AppError> {
        let monitored = self.monitored_places(recommendations)?;
        let mut settings = self.settings()?;
        let mut hits = Vec::new();
        for place in monitored {
            if settings.notified_place_ids.contains(&place.place_id) {
                continue;
            }
            let distance = haversine_meters(lat, lng, place.lat, place.lng);
            if distance <= f64::from(settings.distance_meters) {
                settings.notified_place_ids.push(place.place_id.clone());
                hits.push(ProximityHit {
                    place,
                    distance_meters: distance.round() as u32,
                });
            }
        }
        if !hits.is_empty() {
            self.save(&settings)?;
        }
        Ok(hits)
    }
}

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_METERS * c
}
