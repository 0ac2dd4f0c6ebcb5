pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod validation;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use swar_audio::{PlaybackSession, VirtualOutput};
use swar_speech::{History, RequestSequencer, TtsService, VoiceId};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;

use crate::config::ServerConfig;
use crate::metrics::AppMetrics;

/// Interval at which the output clock advances the shared device.
pub const OUTPUT_TICK: Duration = Duration::from_millis(20);

/// Which voice the preview slot belongs to, and whether its audio is
/// still being generated.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreviewState {
    pub voice: Option<VoiceId>,
    pub pending: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub tts: TtsService,
    pub playback: Arc<PlaybackSession<VirtualOutput>>,
    pub history: Arc<Mutex<History>>,
    pub previews: Arc<RequestSequencer>,
    pub preview: Arc<Mutex<PreviewState>>,
    pub metrics: AppMetrics,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(tts: TtsService, device: VirtualOutput, config: ServerConfig) -> Self {
        Self {
            tts,
            playback: Arc::new(PlaybackSession::new(Arc::new(device))),
            history: Arc::new(Mutex::new(History::new())),
            previews: Arc::new(RequestSequencer::new()),
            preview: Arc::new(Mutex::new(PreviewState::default())),
            metrics: AppMetrics::new(),
            config,
        }
    }

    pub fn history(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn preview(&self) -> MutexGuard<'_, PreviewState> {
        self.preview.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Build the studio router. Every route is served at the root and under `/api`.
pub fn router(state: AppState) -> Router {
    use crate::handlers::*;

    let api = Router::new()
        .route("/health", get(health_check))
        .route("/voices", get(list_voices))
        .route("/voices/{id}/preview", post(preview_voice))
        .route("/preview/stop", post(stop_preview))
        .route("/options", get(list_options))
        .route("/generate", post(generate))
        .route("/history", get(list_history))
        .route("/history/{id}", delete(delete_entry))
        .route("/history/{id}/download", get(download_entry))
        .route("/history/{id}/play", post(play_entry))
        .route("/history/{id}/stop", post(stop_entry))
        .route("/history/{id}/volume", put(set_entry_volume))
        .route("/metrics", get(metrics_endpoint));

    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))
        .layer(middleware::from_fn(add_request_id))
        .with_state(state)
}

async fn count_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.metrics.record_request();
    next.run(request).await
}

/// Request ID middleware for tracing. An incoming `x-request-id` is kept.
async fn add_request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .cloned()
        .or_else(|| HeaderValue::from_str(&uuid::Uuid::new_v4().to_string()).ok());

    if let Some(ref id) = request_id {
        request.headers_mut().insert("x-request-id", id.clone());
    }
    let mut response = next.run(request).await;
    if let Some(id) = request_id {
        response.headers_mut().insert("x-request-id", id);
    }
    response
}

/// Drive `device` in real time so flows progress and report completion.
pub fn spawn_output_clock(device: VirtualOutput) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(tick_ms = OUTPUT_TICK.as_millis() as u64, "output clock started");
        let mut ticker = tokio::time::interval(OUTPUT_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = Instant::now();
        loop {
            ticker.tick().await;
            let now = Instant::now();
            device.advance_by(now.duration_since(last));
            last = now;
        }
    })
}
