// Athlete and session browsing service
use crate::application::stores::AthleteStore;
use crate::domain::session::{Athlete, Session};
use crate::domain::video::VideoInfo;
use serde::Serialize;
use std::sync::Arc;

/// Session decorated for the picker: display label plus normalized video
/// links. Sessions without a recognizable video URL carry `video: null`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionListing {
    pub id: String,
    pub athlete_id: String,
    pub date: Option<String>,
    pub label: String,
    pub notes: Option<String>,
    pub video: Option<VideoInfo>,
}

impl SessionListing {
    pub fn from_session(session: Session) -> Self {
        let label = session.display_label();
        let video = session.video_url.as_deref().and_then(VideoInfo::from_url);
        Self {
            id: session.id,
            athlete_id: session.athlete_id,
            date: session.date,
            label,
            notes: session.notes,
            video,
        }
    }
}

#[derive(Clone)]
pub struct AthleteService {
    store: Arc<dyn AthleteStore>,
}

impl AthleteService {
    pub fn new(store: Arc<dyn AthleteStore>) -> Self {
        Self { store }
    }

    pub async fn athletes(&self) -> Vec<Athlete> {
        match self.store.list_athletes().await {
            Ok(athletes) => athletes,
            Err(e) => {
                tracing::warn!("athlete query failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Sessions for one athlete, newest first as the store returns them.
    pub async fn sessions(&self, athlete_id: &str) -> Vec<SessionListing> {
        match self.store.list_sessions(athlete_id).await {
            Ok(sessions) => sessions.into_iter().map(SessionListing::from_session).collect(),
            Err(e) => {
                tracing::warn!("session query failed for athlete {}: {}", athlete_id, e);
                Vec::new()
            }
        }
    }

    pub async fn session(&self, session_id: &str) -> Option<SessionListing> {
        match self.store.get_session(session_id).await {
            Ok(session) => session.map(SessionListing::from_session),
            Err(e) => {
                tracing::warn!("session lookup failed for {}: {}", session_id, e);
                None
            }
        }
    }
}
