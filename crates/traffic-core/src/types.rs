use serde::{Deserialize, Serialize};

/// Center of Tunis, used for the initial map view and as the draft's default position.
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 36.8065,
    lng: 10.1815,
};

/// Zoom level of the initial map view.
pub const DEFAULT_ZOOM: u8 = 7;

/// Close-in zoom applied after a submission re-centers the map.
pub const FOCUS_ZOOM: u8 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: String,
    pub height: String,
}

impl Default for ContainerSize {
    fn default() -> Self {
        Self {
            width: "100%".to_string(),
            height: "400px".to_string(),
        }
    }
}

/// Initialization parameters handed to the map provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    pub center: LatLng,
    pub default_zoom: u8,
    pub focus_zoom: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub container: ContainerSize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            default_zoom: DEFAULT_ZOOM,
            focus_zoom: FOCUS_ZOOM,
            api_key: None,
            container: ContainerSize::default(),
        }
    }
}
