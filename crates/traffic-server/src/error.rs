use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use traffic_core::{DraftField, IncidentId, ValidationError};

/// Failures the HTTP API reports to the page as `{ "error": ... }` bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing x-session-id header, reload the page")]
    MissingSession,
    #[error("unknown session {0}, reload the page")]
    UnknownSession(String),
    #[error("no incident with id {0}")]
    IncidentNotFound(IncidentId),
    #[error(transparent)]
    Rejected(#[from] ValidationError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing: Option<Vec<DraftField>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingSession => StatusCode::BAD_REQUEST,
            ApiError::UnknownSession(_) | ApiError::IncidentNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let missing = match &self {
            ApiError::Rejected(e) => Some(e.fields().to_vec()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            missing,
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::MissingSession.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::UnknownSession("abc".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        let rejected = ApiError::from(ValidationError::MissingFields(vec![DraftField::ImageUrl]));
        assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            rejected.to_string(),
            "draft is missing required fields: imageUrl"
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = ApiError::IncidentNotFound(IncidentId(42));
        assert_eq!(err.to_string(), "no incident with id 42");
    }
}
