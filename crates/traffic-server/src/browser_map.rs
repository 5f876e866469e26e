use serde::Serialize;
use traffic_core::{LatLng, MapAdapter, MapConfig, MapPhase, MapView};

/// Camera state the page should show. `revision` bumps on every pan or zoom
/// so the page applies each command once.
#[derive(Debug, Clone, Serialize)]
pub struct Camera {
    pub center: LatLng,
    pub zoom: u8,
    pub revision: u64,
}

/// Map view backed by the browser widget. Commands are recorded here and
/// picked up by the page through `/api/map`.
#[derive(Debug, Clone)]
pub struct BrowserMapView {
    markers: Vec<LatLng>,
    marker_revision: u64,
    camera: Camera,
}

impl BrowserMapView {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            markers: Vec::new(),
            marker_revision: 0,
            camera: Camera {
                center: config.center,
                zoom: config.default_zoom,
                revision: 0,
            },
        }
    }
}

impl MapView for BrowserMapView {
    fn set_markers(&mut self, positions: &[LatLng]) {
        self.markers = positions.to_vec();
        self.marker_revision += 1;
    }

    fn pan_to(&mut self, center: LatLng) {
        self.camera.center = center;
        self.camera.revision += 1;
    }

    fn set_zoom(&mut self, level: u8) {
        self.camera.zoom = level;
        self.camera.revision += 1;
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSnapshot {
    pub phase: MapPhase,
    pub placeholder: Option<&'static str>,
    pub camera: Camera,
    pub markers: Vec<LatLng>,
    pub marker_revision: u64,
}

impl MapSnapshot {
    pub fn capture(map: &MapAdapter<BrowserMapView>) -> Self {
        let view = map.view();
        Self {
            phase: map.phase(),
            placeholder: map.placeholder(),
            camera: view.camera.clone(),
            markers: view.markers.clone(),
            marker_revision: view.marker_revision,
        }
    }
}
