use chrono::Utc;
use dashmap::DashMap;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info};
use traffic_core::{MapConfig, Session};

use crate::browser_map::BrowserMapView;

pub type TrafficSession = Session<BrowserMapView>;
pub type SharedSession = Arc<RwLock<TrafficSession>>;

const EVENT_LOG_CAPACITY: usize = 500;
/// Open pages kept at once; the oldest is dropped past this.
const MAX_SESSIONS: usize = 256;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UiEvent {
    MapLoading,
    MapReady,
    DraftEdited { fields: Vec<String> },
    ImageAttached { mime: String, bytes: usize },
    ImageSkipped,
    IncidentSubmitted { id: String },
    SubmissionRejected { missing: Vec<String> },
}

#[derive(Debug, Clone, Serialize)]
pub struct UiEventLogEntry {
    pub timestamp: chrono::DateTime<Utc>,
    pub session: String,
    pub event: UiEvent,
}

/// One page load: its own store, draft and map adapter.
pub struct SessionSlot {
    pub session: SharedSession,
    pub seq: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<DashMap<String, SessionSlot>>,
    pub config: Arc<MapConfig>,
    pub max_image_bytes: usize,
    pub start_time: Instant,
    pub event_log: Arc<RwLock<VecDeque<UiEventLogEntry>>>,
    pub metrics: Option<PrometheusHandle>,
    next_session: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: MapConfig, max_image_bytes: usize, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            config: Arc::new(config),
            max_image_bytes,
            start_time: Instant::now(),
            event_log: Arc::new(RwLock::new(VecDeque::new())),
            metrics,
            next_session: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Start a fresh session for a page load and return its id. The map
    /// adapter begins in `Loading` at the configured center and zoom.
    pub async fn open_session(&self) -> String {
        let seq = self.next_session.fetch_add(1, Ordering::Relaxed);
        let id = format!("{:x}-{}", Utc::now().timestamp_millis(), seq);
        let session = Session::new(BrowserMapView::new(&self.config), (*self.config).clone());
        self.sessions.insert(
            id.clone(),
            SessionSlot {
                session: Arc::new(RwLock::new(session)),
                seq,
            },
        );
        self.evict_oldest();
        info!("Opened session {} ({} open)", id, self.sessions.len());
        self.push_event(&id, UiEvent::MapLoading).await;
        id
    }

    pub fn session(&self, id: &str) -> Option<SharedSession> {
        self.sessions.get(id).map(|slot| slot.session.clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn evict_oldest(&self) {
        while self.sessions.len() > MAX_SESSIONS {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|slot| slot.seq)
                .map(|slot| slot.key().clone());
            match oldest {
                Some(id) => {
                    self.sessions.remove(&id);
                    debug!("Evicted session {}", id);
                }
                None => break,
            }
        }
    }

    pub async fn push_event(&self, session: &str, event: UiEvent) {
        let mut log = self.event_log.write().await;
        log.push_back(UiEventLogEntry {
            timestamp: Utc::now(),
            session: session.to_string(),
            event,
        });
        while log.len() > EVENT_LOG_CAPACITY {
            log.pop_front();
        }
    }

    pub async fn get_events(&self, limit: usize) -> Vec<UiEventLogEntry> {
        let log = self.event_log.read().await;
        let start = log.len().saturating_sub(limit);
        log.iter().skip(start).cloned().collect()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_log_keeps_most_recent() {
        let state = AppState::new(MapConfig::default(), 1024, None);
        for _ in 0..EVENT_LOG_CAPACITY + 10 {
            state.push_event("s", UiEvent::ImageSkipped).await;
        }
        state.push_event("s", UiEvent::MapReady).await;

        assert_eq!(state.event_log.read().await.len(), EVENT_LOG_CAPACITY);
        let last = state.get_events(1).await;
        assert!(matches!(last[0].event, UiEvent::MapReady));
    }

    #[tokio::test]
    async fn test_each_open_starts_a_loading_session() {
        let state = AppState::new(MapConfig::default(), 1024, None);
        let first = state.open_session().await;
        let second = state.open_session().await;
        assert_ne!(first, second);
        assert_eq!(state.session_count(), 2);

        state.session(&first).unwrap().write().await.map_ready();

        let fresh = state.session(&second).unwrap();
        let session = fresh.read().await;
        assert_eq!(session.map().phase(), traffic_core::MapPhase::Loading);
        assert!(session.store().is_empty());
        assert!(state.session("nope").is_none());
    }

    #[tokio::test]
    async fn test_oldest_session_is_evicted() {
        let state = AppState::new(MapConfig::default(), 1024, None);
        let first = state.open_session().await;
        for _ in 0..MAX_SESSIONS {
            state.open_session().await;
        }
        assert_eq!(state.session_count(), MAX_SESSIONS);
        assert!(state.session(&first).is_none());
    }
}
