use uuid::Uuid;

use crate::app::AppError;
use crate::domain::collection::Collection;
use crate::domain::place::PlaceId;
use crate::events::{EventBus, StoreEvent};
use crate::storage::{now_utc_rfc3339, Storage, KEY_COLLECTIONS};

/// User-named sets of place references. Reads self-heal the ordering
/// invariant and silently persist the repaired state.
pub struct CollectionStore<'a> {
    storage: &'a Storage,
    bus: &'a EventBus,
}

impl<'a> CollectionStore<'a> {
    pub fn new(storage: &'a Storage, bus: &'a EventBus) -> Self {
        CollectionStore { storage, bus }
    }

    pub fn list(&self) -> Result<Vec<Collection>, AppError> {
        let mut collections: Vec<Collection> = self.storage.load(KEY_COLLECTIONS)?;
        let mut healed_any = false;
        for collection in &mut collections {
            healed_any |= collection.heal_order();
        }
        if healed_any {
            self.storage.save(KEY_COLLECTIONS, &collections)?;
        }
        Ok(collections)
    }

    pub fn create(&self, name: &str) -> Result<Collection, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(
                "collection name is required".to_string(),
            ));
        }
        let now = now_utc_rfc3339();
        let collection = Collection {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            place_ids: Vec::new(),
            route_mode: false,
            ordered_place_ids: None,
            created_at: now.clone(),
            last_modified: now,
        };
        let mut collections = self.list()?;
        collections.push(collection.clone());
        self.storage.save(KEY_COLLECTIONS, &collections)?;
        self.bus.emit(&StoreEvent::CollectionUpdated {
            collection_id: collection.id.clone(),
        });
        Ok(collection)
    }

    /// Add a place reference. Already a member: no-op, no event.
    pub fn add_place(&self, collection_id: &str, place_id: &PlaceId) -> Result<bool, AppError> {
        self.mutate(collection_id, |collection| {
            if collection.contains(place_id) {
                return false;
            }
            collection.place_ids.push(place_id.clone());
            if let Some(ordered) = &mut collection.ordered_place_ids {
                ordered.push(place_id.clone());
            }
            true
        })
    }

    pub fn remove_place(&self, collection_id: &str, place_id: &PlaceId) -> Result<bool, AppError> {
        self.mutate(collection_id, |collection| {
            let before = collection.place_ids.len();
            collection.place_ids.retain(|id| id != place_id);
            if let Some(ordered) = &mut collection.ordered_place_ids {
                ordered.retain(|id| id != place_id);
            }
            collection.place_ids.len() != before
        })
    }

    /// Enabling snapshots the membership into an explicit ordering;
    /// disabling clears it.
    pub fn toggle_route_mode(&self, collection_id: &str, enabled: bool) -> Result<bool, AppError> {
        self.mutate(collection_id, |collection| {
            collection.route_mode = enabled;
            collection.ordered_place_ids = if enabled {
                Some(collection.place_ids.clone())
            } else {
                None
            };
            true
        })
    }

    pub fn update_ordered_place_ids(
        &self,
        collection_id: &str,
        ordered: Vec<PlaceId>,
    ) -> Result<bool, AppError> {
        self.mutate(collection_id, |collection| {
            collection.ordered_place_ids = Some(ordered.clone());
            // An inconsistent caller-supplied order is repaired rather
            // than rejected.
            collection.heal_order();
            true
        })
    }

    pub fn rename(&self, collection_id: &str, name: &str) -> Result<bool, AppError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation(
                "collection name is required".to_string(),
            ));
        }
        self.mutate(collection_id, |collection| {
            collection.name = name.clone();
            true
        })
    }

    pub fn delete(&self, collection_id: &str) -> Result<bool, AppError> {
        let mut collections = self.list()?;
        let before = collections.len();
        collections.retain(|collection| collection.id != collection_id);
        if collections.len() == before {
            return Ok(false);
        }
        self.storage.save(KEY_COLLECTIONS, &collections)?;
        self.bus.emit(&StoreEvent::CollectionUpdated {
            collection_id: collection_id.to_string(),
        });
        Ok(true)
    }

    pub fn get(&self, collection_id: &str) -> Result<Option<Collection>, AppError> {
        Ok(self
            .list()?
            .into_iter()
            .find(|collection| collection.id == collection_id))
    }

    /// Apply `apply` to the matching collection; persist, stamp
    /// `last_modified` and emit only when it reports a change.
    fn mutate(
        &self,
        collection_id: &str,
        mut apply: impl FnMut(&mut Collection) -> bool,
    ) -> Result<bool, AppError> {
        let mut collections = self.list()?;
        let Some(collection) = collections
            .iter_mut()
            .find(|collection| collection.id == collection_id)
        else {
            return Ok(false);
        };
        if !apply(collection) {
            return Ok(false);
        }
        collection.last_modified = now_utc_rfc3339();
        self.storage.save(KEY_COLLECTIONS, &collections)?;
        self.bus.emit(&StoreEvent::CollectionUpdated {
            collection_id: collection_id.to_string(),
        });
        Ok(true)
    }
}
