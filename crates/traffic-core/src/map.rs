use serde::Serialize;
use tracing::{debug, info};

use crate::types::{LatLng, MapConfig};

/// Copy shown in place of the map until the provider reports ready.
pub const LOADING_PLACEHOLDER: &str = "جاري تحميل الخريطة...";

/// Rendering surface supplied by the map provider.
pub trait MapView {
    /// Replace the whole marker set. Calling twice with the same positions must
    /// leave the same markers on screen.
    fn set_markers(&mut self, positions: &[LatLng]);
    fn pan_to(&mut self, center: LatLng);
    fn set_zoom(&mut self, level: u8);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MapPhase {
    Unloaded,
    Loading,
    Ready,
}

/// Commands issued before the map is ready. Only the latest of each kind is kept.
#[derive(Debug, Default, Clone, PartialEq)]
struct Pending {
    markers: Option<Vec<LatLng>>,
    pan: Option<LatLng>,
    zoom: Option<u8>,
}

pub struct MapAdapter<V> {
    view: V,
    config: MapConfig,
    phase: MapPhase,
    pending: Pending,
    shown_markers: Option<Vec<LatLng>>,
}

impl<V: MapView> MapAdapter<V> {
    pub fn new(view: V, config: MapConfig) -> Self {
        Self {
            view,
            config,
            phase: MapPhase::Unloaded,
            pending: Pending::default(),
            shown_markers: None,
        }
    }

    /// `Unloaded -> Loading`. Has no effect in later phases.
    pub fn load(&mut self) {
        if self.phase == MapPhase::Unloaded {
            info!(
                "Loading map at ({}, {}) zoom {}",
                self.config.center.lat, self.config.center.lng, self.config.default_zoom
            );
            self.phase = MapPhase::Loading;
        }
    }

    /// Provider readiness notification. Flushes buffered commands in
    /// marker, pan, zoom order. Repeated notifications are ignored.
    pub fn on_ready(&mut self) {
        if self.phase == MapPhase::Ready {
            debug!("Ignoring repeated map ready notification");
            return;
        }
        self.phase = MapPhase::Ready;
        info!("Map ready");

        let pending = std::mem::take(&mut self.pending);
        if let Some(markers) = pending.markers {
            self.push_markers(markers);
        }
        if let Some(center) = pending.pan {
            self.view.pan_to(center);
        }
        if let Some(level) = pending.zoom {
            self.view.set_zoom(level);
        }
    }

    pub fn set_markers(&mut self, positions: Vec<LatLng>) {
        if self.is_ready() {
            self.push_markers(positions);
        } else {
            debug!("Buffering {} markers until map is ready", positions.len());
            self.pending.markers = Some(positions);
        }
    }

    pub fn pan_to(&mut self, center: LatLng) {
        if self.is_ready() {
            self.view.pan_to(center);
        } else {
            self.pending.pan = Some(center);
        }
    }

    pub fn set_zoom(&mut self, level: u8) {
        if self.is_ready() {
            self.view.set_zoom(level);
        } else {
            self.pending.zoom = Some(level);
        }
    }

    fn push_markers(&mut self, positions: Vec<LatLng>) {
        if self.shown_markers.as_ref() == Some(&positions) {
            debug!("Marker set unchanged, skipping redraw");
            return;
        }
        self.view.set_markers(&positions);
        self.shown_markers = Some(positions);
    }

    pub fn phase(&self) -> MapPhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == MapPhase::Ready
    }

    /// Loading copy to display, or `None` once the map is up.
    pub fn placeholder(&self) -> Option<&'static str> {
        if self.is_ready() {
            None
        } else {
            Some(LOADING_PLACEHOLDER)
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn view(&self) -> &V {
        &self.view
    }
}

/// Records every command it receives. Used as a stand-in provider in tests.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingMapView {
    pub calls: Vec<MapCall>,
    pub markers: Vec<LatLng>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapCall {
    SetMarkers(Vec<LatLng>),
    PanTo(LatLng),
    SetZoom(u8),
}

impl MapView for RecordingMapView {
    fn set_markers(&mut self, positions: &[LatLng]) {
        self.markers = positions.to_vec();
        self.calls.push(MapCall::SetMarkers(positions.to_vec()));
    }

    fn pan_to(&mut self, center: LatLng) {
        self.calls.push(MapCall::PanTo(center));
    }

    fn set_zoom(&mut self, level: u8) {
        self.calls.push(MapCall::SetZoom(level));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> MapAdapter<RecordingMapView> {
        MapAdapter::new(RecordingMapView::default(), MapConfig::default())
    }

    #[test]
    fn test_phases_advance_in_order() {
        let mut map = adapter();
        assert_eq!(map.phase(), MapPhase::Unloaded);
        assert_eq!(map.placeholder(), Some(LOADING_PLACEHOLDER));

        map.load();
        assert_eq!(map.phase(), MapPhase::Loading);
        assert!(map.placeholder().is_some());

        map.on_ready();
        assert_eq!(map.phase(), MapPhase::Ready);
        assert!(map.placeholder().is_none());

        map.load();
        assert_eq!(map.phase(), MapPhase::Ready);
    }

    #[test]
    fn test_commands_before_ready_are_buffered_then_flushed() {
        let mut map = adapter();
        map.load();
        map.set_markers(vec![LatLng::new(1.0, 1.0)]);
        map.set_markers(vec![LatLng::new(1.0, 1.0), LatLng::new(2.0, 2.0)]);
        map.pan_to(LatLng::new(2.0, 2.0));
        map.set_zoom(14);
        assert!(map.view().calls.is_empty());

        map.on_ready();
        assert_eq!(
            map.view().calls,
            vec![
                MapCall::SetMarkers(vec![LatLng::new(1.0, 1.0), LatLng::new(2.0, 2.0)]),
                MapCall::PanTo(LatLng::new(2.0, 2.0)),
                MapCall::SetZoom(14),
            ]
        );
    }

    #[test]
    fn test_identical_snapshot_is_not_redrawn() {
        let mut map = adapter();
        map.load();
        map.on_ready();

        let snapshot = vec![LatLng::new(36.8, 10.2), LatLng::new(36.8, 10.2)];
        map.set_markers(snapshot.clone());
        map.set_markers(snapshot.clone());

        assert_eq!(map.view().calls.len(), 1);
        assert_eq!(map.view().markers, snapshot);
    }

    #[test]
    fn test_repeated_ready_does_not_replay() {
        let mut map = adapter();
        map.load();
        map.pan_to(LatLng::new(3.0, 4.0));
        map.on_ready();
        map.on_ready();
        assert_eq!(map.view().calls, vec![MapCall::PanTo(LatLng::new(3.0, 4.0))]);
    }
}
