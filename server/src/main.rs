use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::GlobalKeyExtractor, GovernorLayer};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

use server::config::ServerConfig;
use server::{router, spawn_output_clock, AppState};
use swar_audio::shared_output;
use swar_speech::{GeminiClient, TtsService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _ = dotenv::dotenv();

    async_main().await
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let permissive = || {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods.clone())
            .allow_headers(tower_http::cors::Any)
            .allow_credentials(false)
    };

    let Some(ref allowed_origins) = config.cors_allowed_origins else {
        warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (development mode)");
        return permissive();
    };

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        warn!("CORS_ALLOWED_ORIGINS is empty, falling back to permissive CORS");
        return permissive();
    }

    info!("CORS configured for {} origin(s)", origins.len());
    CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers(tower_http::cors::Any)
        .allow_credentials(false)
}

async fn async_main() -> anyhow::Result<()> {
    info!("Starting Swar studio server...");

    let config = ServerConfig::from_env();
    if config.api_key.is_none() {
        warn!("GEMINI_API_KEY not set, generation requests will fail");
    }

    let generator = GeminiClient::new(config.gemini())?;
    let tts = TtsService::new(Arc::new(generator), config.api_key.clone());

    let device = shared_output().clone();
    spawn_output_clock(device.clone());

    let state = AppState::new(tts, device, config.clone());
    info!(
        port = config.port,
        rate_limit = config.rate_limit_per_minute,
        generation_timeout_secs = config.generation_timeout_secs,
        model = %config.gemini_model,
        "Server configuration loaded"
    );

    // All clients share one quota
    let rate = config.rate_limit_per_minute.max(1);
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond((60_000 / rate as u64).max(1))
            .burst_size(rate)
            .key_extractor(GlobalKeyExtractor)
            .finish()
            .context("invalid rate limit configuration")?,
    );
    info!("Rate limiting: {} requests per minute", rate);

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer::new(governor_conf))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(cors_layer(&config))
        .into_inner();

    let app = router(state).layer(middleware_stack);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!("Failed to bind {addr}: {e}. Try a different PORT.")
    })?;

    info!("Server listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
