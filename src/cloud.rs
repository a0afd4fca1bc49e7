use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppError;
use crate::domain::place::{Place, PlaceId, Source, SourceKind};
use crate::domain::recommendation::Recommendation;
use crate::events::{EventBus, StoreEvent};
use crate::storage::{now_utc_rfc3339, Storage, KEY_RECOMMENDATIONS};

/// One remote document per place, keyed by the place id and owned by a
/// user id. The flat shape is the wire contract; buckets are a local
/// notion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDoc {
    pub id: PlaceId,
    pub name: String,
    pub category: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub visited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl PlaceDoc {
    pub fn from_place(place: &Place, bucket: &Recommendation, user_id: &str) -> Self {
        let now = now_utc_rfc3339();
        PlaceDoc {
            id: place.id.clone(),
            name: place.name.clone(),
            category: place.category.clone(),
            city: bucket.city.clone(),
            country: bucket.country.clone(),
            description: place.description.clone(),
            visited: place.visited,
            website: place.website.clone(),
            source_type: place.source.as_ref().map(|source| source.kind),
            source_name: place.source.as_ref().map(|source| source.name.clone()),
            user_id: user_id.to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn to_place(&self) -> Place {
        Place {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            image: None,
            visited: self.visited,
            website: self.website.clone(),
            source: self.source_type.map(|kind| Source {
                kind,
                name: self.source_name.clone().unwrap_or_default(),
                url: None,
            }),
            context: None,
            lat: None,
            lng: None,
        }
    }
}

/// The remote document store seam. The bundled implementation is a
/// JSON directory; a network-backed store plugs in here.
pub trait RemoteStore {
    fn fetch_places(&self, user_id: &str) -> Result<Vec<PlaceDoc>, RemoteError>;
    fn upsert_places(&self, docs: &[PlaceDoc]) -> Result<(), RemoteError>;
}

/// One pretty-printed JSON file per place document, named by place id.
pub struct JsonDirRemote {
    dir: PathBuf,
}

impl JsonDirRemote {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonDirRemote { dir: dir.into() }
    }

    fn doc_path(&self, id: &PlaceId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

impl RemoteStore for JsonDirRemote {
    fn fetch_places(&self, user_id: &str) -> Result<Vec<PlaceDoc>, RemoteError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut docs = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let raw = std::fs::read_to_string(&path)?;
            let doc: PlaceDoc = serde_json::from_str(&raw)?;
            if doc.user_id == user_id {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    fn upsert_places(&self, docs: &[PlaceDoc]) -> Result<(), RemoteError> {
        std::fs::create_dir_all(&self.dir)?;
        for doc in docs {
            let json = serde_json::to_string_pretty(doc)?;
            std::fs::write(self.doc_path(&doc.id), json)?;
        }
        Ok(())
    }
}

/// Per-session reconciliation lifecycle, owned by the app. Never a
/// module-level flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    Uninitialized,
    Reconciling,
    Done,
}

/// Local/remote alignment. Reconciliation merges remote state in once
/// per session with local data winning every conflict; pushes after
/// local mutations are fire-and-forget.
pub struct CloudSync<'a> {
    storage: &'a Storage,
    bus: &'a EventBus,
    remote: &'a dyn RemoteStore,
    user_id: String,
}

impl<'a> CloudSync<'a> {
    pub fn new(
        storage: &'a Storage,
        bus: &'a EventBus,
        remote: &'a dyn RemoteStore,
        user_id: impl Into<String>,
    ) -> Self {
        CloudSync {
            storage,
            bus,
            remote,
            user_id: user_id.into(),
        }
    }

    /// Push every place of a bucket to the remote store. Failures are
    /// logged and swallowed; the local write this follows is already
    /// durable.
    pub fn push_bucket(&self, bucket: &Recommendation) {
        let docs: Vec<PlaceDoc> = bucket
            .places
            .iter()
            .map(|place| PlaceDoc::from_place(place, bucket, &self.user_id))
            .collect();
        if let Err(err) = self.remote.upsert_places(&docs) {
            log::warn!("cloud push for '{}' failed: {}", bucket.city, err);
        }
    }

    /// Merge remote documents into local storage (local wins: only
    /// identifiers absent locally are added, nothing local is
    /// overwritten or deleted), then backfill the entire merged set to
    /// the remote store.
    pub fn reconcile(&self) -> Result<(), AppError> {
        let docs = self.remote.fetch_places(&self.user_id)?;
        let mut buckets: Vec<Recommendation> = self.storage.load(KEY_RECOMMENDATIONS)?;
        let mut changed_city_ids = Vec::new();

        for doc in docs {
            let index = match buckets.iter().position(|bucket| bucket.matches_city(&doc.city)) {
                Some(index) => index,
                None => {
                    buckets.push(Recommendation {
                        id: Uuid::now_v7().to_string(),
                        city_id: Uuid::now_v7().to_string(),
                        city: doc.city.trim().to_string(),
                        country: doc.country.clone(),
                        categories: Vec::new(),
                        places: Vec::new(),
                        date_added: now_utc_rfc3339(),
                    });
                    buckets.len() - 1
                }
            };
            let bucket = &mut buckets[index];
            if bucket.find_place(&doc.id).is_some() {
                continue;
            }
            if !bucket.categories.contains(&doc.category) {
                bucket.categories.push(doc.category.clone());
            }
            bucket.places.push(doc.to_place());
            if !changed_city_ids.contains(&bucket.city_id) {
                changed_city_ids.push(bucket.city_id.clone());
            }
        }

        if !changed_city_ids.is_empty() {
            self.storage.save(KEY_RECOMMENDATIONS, &buckets)?;
            for city_id in changed_city_ids {
                self.bus.emit(&StoreEvent::RecommendationUpdated { city_id });
            }
        }

        let backfill: Vec<PlaceDoc> = buckets
            .iter()
            .flat_map(|bucket| {
                bucket
                    .places
                    .iter()
                    .map(|place| PlaceDoc::from_place(place, bucket, &self.user_id))
            })
            .collect();
        if let Err(err) = self.remote.upsert_places(&backfill) {
            log::warn!("cloud backfill failed: {}", err);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum RemoteError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Io(err) => write!(f, "remote I/O error: {}", err),
            RemoteError::Serialize(err) => write!(f, "remote document error: {}", err),
        }
    }
}

impl Error for RemoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RemoteError::Io(err) => Some(err),
            RemoteError::Serialize(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for RemoteError {
    fn from(value: std::io::Error) -> Self {
        RemoteError::Io(value)
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(value: serde_json::Error) -> Self {
        RemoteError::Serialize(value)
    }
}

/// Default remote directory next to the database file.
pub fn default_remote_dir(db_path: &str) -> PathBuf {
    Path::new(db_path)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("remote")
}
