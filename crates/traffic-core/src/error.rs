use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    Lat,
    Lng,
    Description,
    ImageUrl,
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DraftField::Lat => "lat",
            DraftField::Lng => "lng",
            DraftField::Description => "description",
            DraftField::ImageUrl => "imageUrl",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("draft is missing required fields: {}", join_fields(.0))]
    MissingFields(Vec<DraftField>),
}

impl ValidationError {
    pub fn fields(&self) -> &[DraftField] {
        match self {
            ValidationError::MissingFields(fields) => fields,
        }
    }
}

fn join_fields(fields: &[DraftField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read image {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
