use serde::{Deserialize, Serialize};

use super::place::PlaceId;

/// A user-named set of place references, optionally ordered when route
/// mode is enabled. A collection never owns the places it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub place_ids: Vec<PlaceId>,
    #[serde(default)]
    pub route_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordered_place_ids: Option<Vec<PlaceId>>,
    pub created_at: String,
    pub last_modified: String,
}

impl Collection {
    pub fn contains(&self, place_id: &PlaceId) -> bool {
        self.place_ids.contains(place_id)
    }

    /// The display order: the explicit ordering when valid, membership
    /// order otherwise.
    pub fn ordered(&self) -> &[PlaceId] {
        match &self.ordered_place_ids {
            Some(ordered) => ordered,
            None => &self.place_ids,
        }
    }

    /// Enforce the invariant that `ordered_place_ids`, when present, is
    /// a permutation of `place_ids`. Older stored collections (and any
    /// membership change that bypassed the ordering) are repaired by
    /// dropping unknown or duplicate ids and appending missing members
    /// in membership order. Returns true when a repair was needed.
    pub fn heal_order(&mut self) -> bool {
        let Some(ordered) = &self.ordered_place_ids else {
            return false;
        };

        let mut healed: Vec<PlaceId> = Vec::with_capacity(self.place_ids.len());
        for id in ordered {
            if self.place_ids.contains(id) && !healed.contains(id) {
                healed.push(id.clone());
            }
        }
        for id in &self.place_ids {
            if !healed.contains(id) {
                healed.push(id.clone());
            }
        }

        if healed == *ordered {
            return false;
        }
        self.ordered_place_ids = Some(healed);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::Collection;
    use crate::domain::place::PlaceId;

    fn collection(place_ids: &[&str], ordered: Option<&[&str]>) -> Collection {
        Collection {
            id: "c1".to_string(),
            name: "Weekend".to_string(),
            place_ids: place_ids.iter().map(|id| PlaceId::from(*id)).collect(),
            route_mode: ordered.is_some(),
            ordered_place_ids: ordered
                .map(|ids| ids.iter().map(|id| PlaceId::from(*id)).collect()),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            last_modified: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn heal_appends_missing_members() {
        let mut col = collection(&["a", "b", "c"], Some(&["a", "b"]));
        assert!(col.heal_order());
        let ordered: Vec<&str> = col.ordered().iter().map(|id| id.as_str()).collect();
        assert_eq!(ordered, vec!["a", "b", "c"]);
    }

    #[test]
    fn heal_drops_unknown_and_duplicate_ids() {
        let mut col = collection(&["a", "b"], Some(&["b", "x", "b", "a"]));
        assert!(col.heal_order());
        let ordered: Vec<&str> = col.ordered().iter().map(|id| id.as_str()).collect();
        assert_eq!(ordered, vec!["b", "a"]);
    }

    #[test]
    fn valid_permutation_is_untouched() {
        let mut col = collection(&["a", "b", "c"], Some(&["c", "a", "b"]));
        assert!(!col.heal_order());
        let ordered: Vec<&str> = col.ordered().iter().map(|id| id.as_str()).collect();
        assert_eq!(ordered, vec!["c", "a", "b"]);
    }

    #[test]
    fn missing_ordering_falls_back_to_membership() {
        let mut col = collection(&["a", "b"], None);
        assert!(!col.heal_order());
        let ordered: Vec<&str> = col.ordered().iter().map(|id| id.as_str()).collect();
        assert_eq!(ordered, vec!["a", "b"]);
    }
}
