use tracing::{info, warn};

use crate::draft::{Draft, ReadyDraft};
use crate::error::{IngestError, ValidationError};
use crate::gallery::{self, GalleryCard};
use crate::incident::{IdMinter, Incident, IncidentStore};
use crate::map::{MapAdapter, MapView};
use crate::types::{LatLng, MapConfig};
use crate::upload::ImageDataUri;

/// All state of one tracking session: the form draft, the submitted
/// incidents and the map they are shown on. Every mutation takes `&mut self`,
/// so a submission's effects land together.
pub struct Session<V> {
    draft: Draft,
    store: IncidentStore,
    minter: IdMinter,
    map: MapAdapter<V>,
}

impl<V: MapView> Session<V> {
    /// Start a session. The map begins loading immediately.
    pub fn new(view: V, config: MapConfig) -> Self {
        let mut map = MapAdapter::new(view, config);
        map.load();
        Self {
            draft: Draft::default(),
            store: IncidentStore::new(),
            minter: IdMinter::new(),
            map,
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    pub fn store(&self) -> &IncidentStore {
        &self.store
    }

    pub fn map(&self) -> &MapAdapter<V> {
        &self.map
    }

    /// Apply the completion of an image read. A failed read leaves the
    /// current image in place. Whichever completion is applied last wins.
    pub fn apply_image(&mut self, result: Result<ImageDataUri, IngestError>) -> bool {
        match result {
            Ok(image) => {
                self.draft.set_image(image);
                true
            }
            Err(e) => {
                warn!("Image read failed, keeping previous image: {}", e);
                false
            }
        }
    }

    /// Record a validated draft as a new incident, re-center the map on it and
    /// clear the form.
    pub fn submit(&mut self, ready: ReadyDraft) -> Incident {
        let fields = ready.into_inner();
        let incident = Incident {
            id: self.minter.mint(),
            lat: fields.lat,
            lng: fields.lng,
            description: fields.description,
            image_url: fields.image_url,
        };
        self.store.append(incident.clone());
        self.draft.reset();

        let focus_zoom = self.map.config().focus_zoom;
        self.map.set_markers(self.store.all().positions().collect());
        self.map.pan_to(incident.position());
        self.map.set_zoom(focus_zoom);

        info!(
            "Incident {} recorded at ({}, {}), {} in store",
            incident.id,
            incident.lat,
            incident.lng,
            self.store.len()
        );
        incident
    }

    /// Validate the current draft and submit it.
    pub fn submit_draft(&mut self) -> Result<Incident, ValidationError> {
        let ready = self.draft.validate()?;
        Ok(self.submit(ready))
    }

    /// Readiness notification from the map provider. Pushes the current
    /// marker set along with anything buffered while loading.
    pub fn map_ready(&mut self) {
        self.map.set_markers(self.markers());
        self.map.on_ready();
    }

    pub fn markers(&self) -> Vec<LatLng> {
        self.store.all().positions().collect()
    }

    pub fn gallery(&self) -> Vec<GalleryCard> {
        gallery::cards(self.store.all())
    }
}
