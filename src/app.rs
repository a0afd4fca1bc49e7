use std::cell::Cell;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;

use crate::cloud::{CloudSync, JsonDirRemote, ReconcileState, RemoteError, RemoteStore};
use crate::collections::CollectionStore;
use crate::config::{Config, ConfigError};
use crate::domain::place::PlaceId;
use crate::domain::recommendation::Recommendation;
use crate::events::EventBus;
use crate::images::{ImageProvider, PlaceholderImages};
use crate::parser::{parse, ParseInput};
use crate::proximity::ProximityStore;
use crate::recommendations::RecommendationStore;
use crate::routes::RouteStore;
use crate::storage::{Storage, StorageError};
use crate::trips::TripStore;
use crate::user_places::UserPlaceStore;

/// The application facade: owns storage, the event bus and the
/// provider seams, hands out the per-entity stores, and orchestrates
/// the flows that span more than one store (visited propagation,
/// user-place registration, cloud pushes, session reconciliation).
///
/// Deliberately `!Sync`: all mutation is single-threaded and
/// synchronous with respect to local persistence.
pub struct App {
    storage: Storage,
    bus: EventBus,
    images: Box<dyn ImageProvider>,
    remote: Box<dyn RemoteStore>,
    user_id: String,
    reconcile_state: Cell<ReconcileState>,
}

impl App {
    pub fn open(config: &Config) -> Result<App, AppError> {
        let storage = Storage::open(&config.db_path)?;
        let app = App::new(
            storage,
            Box::new(JsonDirRemote::new(config.remote_dir.clone())),
            Box::new(PlaceholderImages),
            config.user_id.clone(),
        );
        app.proximity()
            .seed_default_distance(config.proximity_default_distance)?;
        Ok(app)
    }

    pub fn new(
        storage: Storage,
        remote: Box<dyn RemoteStore>,
        images: Box<dyn ImageProvider>,
        user_id: impl Into<String>,
    ) -> App {
        App {
            storage,
            bus: EventBus::new(),
            images,
            remote,
            user_id: user_id.into(),
            reconcile_state: Cell::new(ReconcileState::Uninitialized),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn recommendations(&self) -> RecommendationStore<'_> {
        RecommendationStore::new(&self.storage, &self.bus, self.images.as_ref())
    }

    pub fn collections(&self) -> CollectionStore<'_> {
        CollectionStore::new(&self.storage, &self.bus)
    }

    pub fn routes(&self) -> RouteStore<'_> {
        RouteStore::new(&self.storage, &self.bus)
    }

    pub fn trips(&self) -> TripStore<'_> {
        TripStore::new(&self.storage, &self.bus)
    }

    pub fn user_places(&self) -> UserPlaceStore<'_> {
        UserPlaceStore::new(&self.storage, &self.bus)
    }

    pub fn proximity(&self) -> ProximityStore<'_> {
        ProximityStore::new(&self.storage, &self.bus)
    }

    fn cloud(&self) -> CloudSync<'_> {
        CloudSync::new(&self.storage, &self.bus, self.remote.as_ref(), &self.user_id)
    }

    /// Parse and store a recommendation, register its city on the home
    /// list, and push the merged bucket to the remote store.
    pub fn add_recommendation(
        &self,
        city: &str,
        input: ParseInput,
        country: Option<String>,
    ) -> Result<Recommendation, AppError> {
        let mut parsed = parse(city, input, None);
        parsed.country = country;
        let bucket = self.recommendations().store(parsed)?;
        self.user_places()
            .register(&bucket.city, bucket.country.as_deref())?;
        self.cloud().push_bucket(&bucket);
        Ok(bucket)
    }

    /// Toggle visited from the recommendation side and propagate the
    /// new value into every route and trip referencing the place.
    pub fn mark_visited(&self, place_id: &PlaceId, visited: bool) -> Result<bool, AppError> {
        if !self.recommendations().mark_visited(place_id, visited)? {
            return Ok(false);
        }
        self.propagate_and_push(place_id, visited)?;
        Ok(true)
    }

    /// Toggle visited from inside a route: write through to the source
    /// recommendation, then propagate everywhere.
    pub fn set_route_place_visited(
        &self,
        route_id: &str,
        place_id: &PlaceId,
        visited: bool,
    ) -> Result<bool, AppError> {
        if !self.routes().set_visited(route_id, place_id, visited)? {
            return Ok(false);
        }
        self.recommendations().mark_visited(place_id, visited)?;
        self.propagate_and_push(place_id, visited)?;
        Ok(true)
    }

    /// Trip-side counterpart of [`App::set_route_place_visited`].
    pub fn set_trip_place_visited(
        &self,
        trip_id: &str,
        place_id: &PlaceId,
        visited: bool,
    ) -> Result<bool, AppError> {
        if !self.trips().set_visited(trip_id, place_id, visited)? {
            return Ok(false);
        }
        self.recommendations().mark_visited(place_id, visited)?;
        self.propagate_and_push(place_id, visited)?;
        Ok(true)
    }

    fn propagate_and_push(&self, place_id: &PlaceId, visited: bool) -> Result<(), AppError> {
        self.routes().propagate_visited(place_id, visited)?;
        self.trips().propagate_visited(place_id, visited)?;
        if let Some(bucket) = self.recommendations().bucket_of(place_id)? {
            self.cloud().push_bucket(&bucket);
        }
        Ok(())
    }

    /// Deletion does not cascade; dangling references in collections,
    /// routes and trips are tolerated and pruned lazily on display.
    pub fn delete_place(&self, place_id: &PlaceId) -> Result<bool, AppError> {
        self.recommendations().delete(place_id)
    }

    /// Prune a route's references to places that no longer exist.
    pub fn validate_route(&self, route_id: &str) -> Result<bool, AppError> {
        let known = self.known_place_ids()?;
        self.routes().validate_places(route_id, &known)
    }

    fn known_place_ids(&self) -> Result<HashSet<PlaceId>, AppError> {
        let buckets = self.recommendations().list()?;
        Ok(buckets
            .iter()
            .flat_map(|bucket| bucket.places.iter().map(|place| place.id.clone()))
            .collect())
    }

    /// Run cloud reconciliation at most once per app session. Returns
    /// whether this call performed the pass. A remote failure is logged
    /// and the session still moves to done; there is no retry until
    /// the next session.
    pub fn reconcile_once(&self) -> Result<bool, AppError> {
        if self.reconcile_state.get() != ReconcileState::Uninitialized {
            return Ok(false);
        }
        self.reconcile_state.set(ReconcileState::Reconciling);
        if let Err(err) = self.cloud().reconcile() {
            log::warn!("cloud reconciliation failed: {}", err);
        }
        self.reconcile_state.set(ReconcileState::Done);
        Ok(true)
    }

    pub fn reconcile_state(&self) -> ReconcileState {
        self.reconcile_state.get()
    }
}

#[derive(Debug)]
pub enum AppError {
    Storage(StorageError),
    Remote(RemoteError),
    Config(ConfigError),
    Io(std::io::Error),
    Validation(String),
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Storage(err) => write!(f, "{}", err),
            AppError::Remote(err) => write!(f, "{}", err),
            AppError::Config(err) => write!(f, "{}", err),
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Validation(message) => write!(f, "{}", message),
            AppError::NotFound(what) => write!(f, "{} not found", what),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Storage(err) => Some(err),
            AppError::Remote(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Validation(_) => None,
            AppError::NotFound(_) => None,
        }
    }
}

impl From<StorageError> for AppError {
    fn from(value: StorageError) -> Self {
        AppError::Storage(value)
    }
}

impl From<RemoteError> for AppError {
    fn from(value: RemoteError) -> Self {
        AppError::Remote(value)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

#[cfg(test)]
mod tests;
