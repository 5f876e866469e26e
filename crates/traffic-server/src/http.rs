use crate::browser_map::MapSnapshot;
use crate::error::ApiError;
use crate::metrics;
use crate::state::{AppState, SharedSession, UiEvent};
use crate::static_ui;
use axum::{
    async_trait,
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequestParts, Path, Query, State},
    http::{header::CONTENT_TYPE, request::Parts, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::{get, patch, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use traffic_core::{Draft, DraftField, GalleryCard, ImageDataUri, Incident, IncidentId};

/// Header the page echoes back with the id it was served by `GET /`.
pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Deserialize)]
struct EventsQuery {
    limit: Option<usize>,
}

/// Form fields sent by the page, either as edits or along with a submit.
#[derive(Deserialize)]
struct DraftPatch {
    lat: Option<f64>,
    lng: Option<f64>,
    description: Option<String>,
}

impl DraftPatch {
    /// Apply the present fields and name the ones that changed.
    fn apply(self, draft: &mut Draft) -> Vec<String> {
        let mut edited = Vec::new();
        if let Some(lat) = self.lat {
            draft.set_lat(lat);
            edited.push(DraftField::Lat.to_string());
        }
        if let Some(lng) = self.lng {
            draft.set_lng(lng);
            edited.push(DraftField::Lng.to_string());
        }
        if let Some(description) = self.description {
            draft.set_description(description);
            edited.push(DraftField::Description.to_string());
        }
        edited
    }
}

/// The page session named by the request's `x-session-id` header.
struct ActiveSession {
    id: String,
    session: SharedSession,
}

#[async_trait]
impl FromRequestParts<AppState> for ActiveSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::MissingSession)?;
        let session = state
            .session(id)
            .ok_or_else(|| ApiError::UnknownSession(id.to_string()))?;
        Ok(Self {
            id: id.to_string(),
            session,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    draft: Draft,
    missing: Vec<DraftField>,
    incidents: Vec<GalleryCard>,
    map: MapSnapshot,
}

#[derive(Serialize)]
struct ImageAccepted {
    mime: String,
    bytes: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: u64,
    sessions: usize,
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_image_bytes;
    Router::new()
        .route("/", get(ui_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/session", get(session_handler))
        .route("/api/draft", patch(patch_draft_handler))
        .route("/api/draft/image", put(image_handler))
        .route("/api/incidents", get(list_incidents_handler).post(submit_handler))
        .route("/api/incidents/:id", get(incident_handler))
        .route("/api/map", get(map_handler))
        .route("/api/map/ready", post(map_ready_handler))
        .route("/api/events", get(events_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Every page load gets a new session: empty store, empty draft, map loading.
async fn ui_handler(State(state): State<AppState>) -> Html<String> {
    let session_id = state.open_session().await;
    Html(static_ui::render(&state.config, &session_id))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.uptime_seconds(),
        sessions: state.session_count(),
    })
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "# metrics recorder not installed\n".to_string(),
        ),
    }
}

async fn session_handler(active: ActiveSession) -> impl IntoResponse {
    let session = active.session.read().await;
    Json(SessionView {
        draft: session.draft().clone(),
        missing: session.draft().missing_fields(),
        incidents: session.gallery(),
        map: MapSnapshot::capture(session.map()),
    })
}

async fn patch_draft_handler(
    State(state): State<AppState>,
    active: ActiveSession,
    Json(patch): Json<DraftPatch>,
) -> impl IntoResponse {
    let (edited, draft) = {
        let mut session = active.session.write().await;
        let edited = patch.apply(session.draft_mut());
        (edited, session.draft().clone())
    };
    state
        .push_event(&active.id, UiEvent::DraftEdited { fields: edited })
        .await;
    Json(draft)
}

async fn image_handler(
    State(state): State<AppState>,
    active: ActiveSession,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    if body.is_empty() {
        state.push_event(&active.id, UiEvent::ImageSkipped).await;
        return StatusCode::NO_CONTENT.into_response();
    }

    let declared = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .filter(|mime| mime.starts_with("image/"));
    let image = ImageDataUri::from_bytes(&body, declared);
    let accepted = ImageAccepted {
        mime: image.mime().to_string(),
        bytes: body.len(),
    };

    active.session.write().await.apply_image(Ok(image));
    metrics::record_image(accepted.bytes);
    state
        .push_event(
            &active.id,
            UiEvent::ImageAttached {
                mime: accepted.mime.clone(),
                bytes: accepted.bytes,
            },
        )
        .await;

    Json(accepted).into_response()
}

/// Submit the draft. Form fields in the body are applied under the same lock
/// first, so the incident matches the form even if a PATCH has not arrived yet.
async fn submit_handler(
    State(state): State<AppState>,
    active: ActiveSession,
    form: Option<Json<DraftPatch>>,
) -> Result<(StatusCode, Json<Incident>), ApiError> {
    let (edited, result) = {
        let mut session = active.session.write().await;
        let edited = form
            .map(|Json(patch)| patch.apply(session.draft_mut()))
            .unwrap_or_default();
        let result = session
            .submit_draft()
            .map(|incident| (incident, session.store().len()));
        (edited, result)
    };

    if !edited.is_empty() {
        state
            .push_event(&active.id, UiEvent::DraftEdited { fields: edited })
            .await;
    }

    match result {
        Ok((incident, store_len)) => {
            metrics::record_submission(store_len);
            state
                .push_event(
                    &active.id,
                    UiEvent::IncidentSubmitted {
                        id: incident.id.to_string(),
                    },
                )
                .await;
            Ok((StatusCode::CREATED, Json(incident)))
        }
        Err(e) => {
            warn!("Submission rejected: {}", e);
            metrics::record_rejected_submission();
            state
                .push_event(
                    &active.id,
                    UiEvent::SubmissionRejected {
                        missing: e.fields().iter().map(ToString::to_string).collect(),
                    },
                )
                .await;
            Err(e.into())
        }
    }
}

async fn list_incidents_handler(active: ActiveSession) -> impl IntoResponse {
    let session = active.session.read().await;
    let incidents: Vec<Incident> = session.store().all().iter().cloned().collect();
    Json(incidents)
}

async fn incident_handler(
    active: ActiveSession,
    Path(id): Path<i64>,
) -> Result<Json<Incident>, ApiError> {
    let session = active.session.read().await;
    session
        .store()
        .get(IncidentId(id))
        .cloned()
        .map(Json)
        .ok_or(ApiError::IncidentNotFound(IncidentId(id)))
}

async fn map_handler(active: ActiveSession) -> impl IntoResponse {
    let session = active.session.read().await;
    Json(MapSnapshot::capture(session.map()))
}

async fn map_ready_handler(
    State(state): State<AppState>,
    active: ActiveSession,
) -> impl IntoResponse {
    let snapshot = {
        let mut session = active.session.write().await;
        session.map_ready();
        MapSnapshot::capture(session.map())
    };
    info!("Browser map reported ready for session {}", active.id);
    state.push_event(&active.id, UiEvent::MapReady).await;
    Json(snapshot)
}

async fn events_handler(
    State(state): State<AppState>,
    Query(params): Query<EventsQuery>,
) -> impl IntoResponse {
    Json(state.get_events(params.limit.unwrap_or(50)).await)
}
