// Progressive session stream - skeleton first, series lines as they resolve
use crate::application::athlete_service::AthleteService;
use crate::application::view_service::{build_line, ViewService};
use crate::domain::chart::LineSeries;
use crate::domain::metric::MetricMeta;
use crate::domain::phase::Phase;
use crate::domain::video::VideoInfo;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::mpsc;

/// Messages of the progressive load, in arrival order: one skeleton, then
/// one series per metric that resolved (unordered), then one completion.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    Skeleton {
        session_id: String,
        metrics: Vec<String>,
        auto_level: Option<i64>,
        meta: HashMap<String, MetricMeta>,
        phases: Vec<Phase>,
        video: Option<VideoInfo>,
    },
    Series {
        line: LineSeries,
    },
    Complete {
        series_count: usize,
        duration_ms: i64,
    },
}

#[derive(Clone)]
pub struct SessionStreamService {
    view_service: ViewService,
    athletes: AthleteService,
}

impl SessionStreamService {
    pub fn new(view_service: ViewService, athletes: AthleteService) -> Self {
        Self {
            view_service,
            athletes,
        }
    }

    /// Streams one session: the skeleton goes out as soon as the catalog
    /// is known, every metric resolves in its own task, and a completion
    /// message closes the stream once all of them have landed.
    pub async fn stream_session(&self, session_id: &str) -> mpsc::Receiver<StreamMessage> {
        let (tx, rx) = mpsc::channel(100);
        let start_time = Instant::now();

        // 1. Discover the session and send the skeleton immediately
        let (catalog, meta) = self.view_service.catalog(session_id, None).await;
        let phases = self.view_service.phases(session_id).await;
        let video = self.athletes.session(session_id).await.and_then(|s| s.video);

        tracing::debug!(
            "streaming {} metrics for session {}",
            catalog.metrics.len(),
            session_id
        );

        let skeleton = StreamMessage::Skeleton {
            session_id: session_id.to_string(),
            metrics: catalog.metrics.clone(),
            auto_level: catalog.auto_level,
            meta: meta.clone(),
            phases,
            video,
        };
        let _ = tx.send(skeleton).await;

        // 2. Spawn one resolve per metric; lines go out as they finish.
        // Smoothing is left to the stateful endpoints, the stream always
        // carries raw values.
        let mut tasks = Vec::with_capacity(catalog.metrics.len());
        for (position, metric) in catalog.metrics.iter().enumerate() {
            let tx = tx.clone();
            let resolver = self.view_service.resolver().clone();
            let session_id = session_id.to_string();
            let metric = metric.clone();
            let meta = meta.get(&metric).cloned();

            tasks.push(tokio::spawn(async move {
                let request = vec![metric.clone()];
                let resolved = resolver.resolve(&session_id, &request).await;
                // Only send if the metric actually resolved
                let Some(points) = resolved.get(&metric) else {
                    return false;
                };
                let line = build_line(&metric, points, meta.as_ref(), position, false);
                tx.send(StreamMessage::Series { line }).await.is_ok()
            }));
        }

        // 3. Completion once every resolve task has finished
        let tx_complete = tx.clone();
        tokio::spawn(async move {
            let mut series_count = 0;
            for task in tasks {
                if matches!(task.await, Ok(true)) {
                    series_count += 1;
                }
            }
            let duration_ms = start_time.elapsed().as_millis() as i64;
            let _ = tx_complete
                .send(StreamMessage::Complete {
                    series_count,
                    duration_ms,
                })
                .await;
        });

        rx
    }
}
