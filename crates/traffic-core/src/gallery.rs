use serde::Serialize;

use crate::incident::{Incident, IncidentId, Incidents};

/// One card of the "recent incidents" gallery.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryCard {
    pub id: IncidentId,
    pub image_url: String,
    pub description: String,
    pub caption: String,
}

impl From<&Incident> for GalleryCard {
    fn from(incident: &Incident) -> Self {
        Self {
            id: incident.id,
            image_url: incident.image_url.clone(),
            description: incident.description.clone(),
            caption: format!("خط العرض: {}, خط الطول: {}", incident.lat, incident.lng),
        }
    }
}

pub fn cards(incidents: Incidents<'_>) -> Vec<GalleryCard> {
    incidents.iter().map(GalleryCard::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incident::IncidentStore;

    #[test]
    fn test_one_card_per_incident_in_order() {
        let mut store = IncidentStore::new();
        for (id, text) in [(1, "A"), (2, "B")] {
            store.append(Incident {
                id: IncidentId(id),
                lat: 36.8,
                lng: 10.2,
                description: text.to_string(),
                image_url: "data:image/png;base64,AAA=".to_string(),
            });
        }

        let cards = cards(store.all());
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].description, "A");
        assert_eq!(cards[1].description, "B");
        assert_eq!(cards[0].caption, "خط العرض: 36.8, خط الطول: 10.2");
    }
}
