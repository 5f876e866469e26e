use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::LatLng;

/// Millisecond-derived identifier, strictly increasing within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentId(pub i64);

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: IncidentId,
    pub lat: f64,
    pub lng: f64,
    pub description: String,
    pub image_url: String,
}

impl Incident {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// Hands out ids from the wall clock, bumping past the last id when the clock
/// repeats or steps backwards.
#[derive(Debug, Default)]
pub struct IdMinter {
    last: Option<i64>,
}

impl IdMinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self) -> IncidentId {
        self.mint_at(Utc::now().timestamp_millis())
    }

    pub fn mint_at(&mut self, now_ms: i64) -> IncidentId {
        let next = match self.last {
            Some(last) if now_ms <= last => last + 1,
            _ => now_ms,
        };
        self.last = Some(next);
        IncidentId(next)
    }
}

/// Append-only, insertion-ordered incident list.
#[derive(Debug, Default, Clone)]
pub struct IncidentStore {
    incidents: Vec<Incident>,
}

impl IncidentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, incident: Incident) {
        self.incidents.push(incident);
    }

    pub fn all(&self) -> Incidents<'_> {
        Incidents {
            items: &self.incidents,
        }
    }

    pub fn get(&self, id: IncidentId) -> Option<&Incident> {
        self.incidents.iter().find(|incident| incident.id == id)
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }
}

/// Read-only view over the store. Copyable, so every consumer can walk it
/// from the start independently.
#[derive(Debug, Clone, Copy)]
pub struct Incidents<'a> {
    items: &'a [Incident],
}

impl<'a> Incidents<'a> {
    pub fn iter(&self) -> std::slice::Iter<'a, Incident> {
        self.items.iter()
    }

    pub fn positions(&self) -> impl Iterator<Item = LatLng> + 'a {
        self.items.iter().map(Incident::position)
    }
}

impl<'a> IntoIterator for Incidents<'a> {
    type Item = &'a Incident;
    type IntoIter = std::slice::Iter<'a, Incident>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incident(id: i64, lat: f64, lng: f64, description: &str) -> Incident {
        Incident {
            id: IncidentId(id),
            lat,
            lng,
            description: description.to_string(),
            image_url: "data:image/png;base64,AAA=".to_string(),
        }
    }

    #[test]
    fn test_minter_disambiguates_same_millisecond() {
        let mut minter = IdMinter::new();
        let a = minter.mint_at(1_700_000_000_000);
        let b = minter.mint_at(1_700_000_000_000);
        let c = minter.mint_at(1_700_000_000_000);
        assert_eq!(a, IncidentId(1_700_000_000_000));
        assert!(b > a);
        assert!(c > b);
    }

    #[test]
    fn test_minter_survives_clock_going_backwards() {
        let mut minter = IdMinter::new();
        let a = minter.mint_at(2_000);
        let b = minter.mint_at(1_000);
        assert_eq!(b, IncidentId(2_001));
        let c = minter.mint_at(5_000);
        assert_eq!(c, IncidentId(5_000));
        assert!(a < b && b < c);
    }

    #[test]
    fn test_wall_clock_mint_is_monotonic() {
        let mut minter = IdMinter::new();
        let ids: Vec<_> = (0..100).map(|_| minter.mint()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_store_preserves_insertion_order() {
        let mut store = IncidentStore::new();
        store.append(incident(1, 36.8, 10.2, "A"));
        store.append(incident(2, 35.8, 10.6, "B"));
        store.append(incident(3, 34.7, 10.7, "C"));

        let order: Vec<&str> = store.all().iter().map(|i| i.description.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_store_keeps_identical_entries() {
        let mut store = IncidentStore::new();
        store.append(incident(1, 36.8, 10.2, "same"));
        store.append(incident(2, 36.8, 10.2, "same"));

        assert_eq!(store.len(), 2);
        let positions: Vec<LatLng> = store.all().positions().collect();
        assert_eq!(positions, vec![LatLng::new(36.8, 10.2); 2]);
    }

    #[test]
    fn test_view_is_restartable() {
        let mut store = IncidentStore::new();
        store.append(incident(1, 1.0, 2.0, "x"));
        store.append(incident(2, 3.0, 4.0, "y"));

        let view = store.all();
        let first: Vec<_> = view.into_iter().map(|i| i.id).collect();
        let second: Vec<_> = view.iter().map(|i| i.id).collect();
        assert_eq!(first, second);
        assert_eq!(view.iter().count(), 2);
    }

    #[test]
    fn test_lookup_by_id() {
        let mut store = IncidentStore::new();
        store.append(incident(10, 1.0, 2.0, "x"));
        store.append(incident(11, 3.0, 4.0, "y"));

        assert_eq!(store.get(IncidentId(11)).map(|i| i.description.as_str()), Some("y"));
        assert!(store.get(IncidentId(12)).is_none());
    }

    #[test]
    fn test_incident_json_uses_camel_case() {
        let json = serde_json::to_value(incident(7, 1.5, 2.5, "x")).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["imageUrl"], "data:image/png;base64,AAA=");
    }
}
