// Application state for HTTP handlers
use crate::application::athlete_service::AthleteService;
use crate::application::session_view::ViewHandle;
use crate::application::streaming_service::SessionStreamService;
use crate::application::view_service::ViewService;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

pub struct AppState {
    pub athlete_service: AthleteService,
    pub view_service: ViewService,
    pub stream_service: SessionStreamService,
    /// Tick period handed to every spawned view actor.
    pub frame_interval: Duration,
    views: Mutex<HashMap<String, ViewHandle>>,
    next_view_id: AtomicU64,
}

impl AppState {
    pub fn new(
        athlete_service: AthleteService,
        view_service: ViewService,
        stream_service: SessionStreamService,
        frame_interval: Duration,
    ) -> Self {
        Self {
            athlete_service,
            view_service,
            stream_service,
            frame_interval,
            views: Mutex::new(HashMap::new()),
            next_view_id: AtomicU64::new(0),
        }
    }

    /// Registers a freshly spawned view actor and returns its id.
    pub async fn register_view(&self, handle: ViewHandle) -> String {
        let id = self.next_view_id.fetch_add(1, Ordering::Relaxed) + 1;
        let view_id = format!("view-{}", id);
        self.views.lock().await.insert(view_id.clone(), handle);
        view_id
    }

    pub async fn view(&self, view_id: &str) -> Option<ViewHandle> {
        self.views.lock().await.get(view_id).cloned()
    }

    pub async fn remove_view(&self, view_id: &str) -> Option<ViewHandle> {
        self.views.lock().await.remove(view_id)
    }
}
