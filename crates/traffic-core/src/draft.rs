use serde::{Deserialize, Serialize};

use crate::error::{DraftField, ValidationError};
use crate::types::DEFAULT_CENTER;
use crate::upload::ImageDataUri;

/// The incident being composed in the form, before submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub lat: f64,
    pub lng: f64,
    pub description: String,
    pub image_url: String,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            lat: DEFAULT_CENTER.lat,
            lng: DEFAULT_CENTER.lng,
            description: String::new(),
            image_url: String::new(),
        }
    }
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_lat(&mut self, lat: f64) {
        self.lat = lat;
    }

    pub fn set_lng(&mut self, lng: f64) {
        self.lng = lng;
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_image(&mut self, image: ImageDataUri) {
        self.image_url = image.into_string();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn missing_fields(&self) -> Vec<DraftField> {
        let mut missing = Vec::new();
        if !self.lat.is_finite() {
            missing.push(DraftField::Lat);
        }
        if !self.lng.is_finite() {
            missing.push(DraftField::Lng);
        }
        if self.description.is_empty() {
            missing.push(DraftField::Description);
        }
        if self.image_url.is_empty() {
            missing.push(DraftField::ImageUrl);
        }
        missing
    }

    /// Snapshot the draft for submission if every required field holds a value.
    pub fn validate(&self) -> Result<ReadyDraft, ValidationError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(ReadyDraft(self.clone()))
        } else {
            Err(ValidationError::MissingFields(missing))
        }
    }
}

/// A draft that passed required-field checks. Only `Draft::validate` builds one.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyDraft(Draft);

impl ReadyDraft {
    pub fn into_inner(self) -> Draft {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> Draft {
        let mut draft = Draft::new();
        draft.set_lat(36.8);
        draft.set_lng(10.2);
        draft.set_description("حادث");
        draft.set_image(ImageDataUri::from_bytes(b"\x89PNG\r\n\x1a\nrest", None));
        draft
    }

    #[test]
    fn test_defaults_to_tunis_center() {
        let draft = Draft::new();
        assert_eq!(draft.lat, 36.8065);
        assert_eq!(draft.lng, 10.1815);
        assert!(draft.description.is_empty());
        assert!(draft.image_url.is_empty());
    }

    #[test]
    fn test_setters_replace_only_their_field() {
        let mut draft = filled();
        let before = draft.clone();

        draft.set_lat(35.0);
        assert_eq!(draft.lat, 35.0);
        assert_eq!(draft.lng, before.lng);
        assert_eq!(draft.description, before.description);
        assert_eq!(draft.image_url, before.image_url);

        draft.set_description("زحمة");
        assert_eq!(draft.lat, 35.0);
        assert_eq!(draft.description, "زحمة");
        assert_eq!(draft.image_url, before.image_url);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut draft = filled();
        draft.reset();
        assert_eq!(draft, Draft::default());
    }

    #[test]
    fn test_validate_reports_missing_fields() {
        let err = Draft::new().validate().unwrap_err();
        assert_eq!(err.fields(), &[DraftField::Description, DraftField::ImageUrl]);

        let mut draft = filled();
        draft.set_lng(f64::NAN);
        let err = draft.validate().unwrap_err();
        assert_eq!(err.fields(), &[DraftField::Lng]);
    }

    #[test]
    fn test_validate_accepts_complete_draft() {
        let draft = filled();
        let ready = draft.validate().unwrap();
        assert_eq!(ready.into_inner(), draft);
    }

    #[test]
    fn test_out_of_range_coordinates_are_accepted() {
        let mut draft = filled();
        draft.set_lat(500.0);
        draft.set_lng(-900.0);
        assert!(draft.validate().is_ok());
    }
}
