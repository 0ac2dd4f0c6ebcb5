//! Common utilities for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header::HeaderMap, Request, StatusCode},
    Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use server::config::ServerConfig;
use server::{router, AppState};
use swar_audio::VirtualOutput;
use swar_speech::{
    GenerateContentResponse, GenerationError, Part, SpeechGenerator, SpeechRequest, TtsService,
};
use tokio::sync::Notify;
use tower::ServiceExt;

/// Frames in every clip the mock returns (100 ms at 24 kHz).
pub const CLIP_FRAMES: usize = 2_400;

pub enum MockReply {
    Audio,
    TextOnly,
    Fail(String),
}

/// Stand-in for the remote speech model.
pub struct MockGenerator {
    pub calls: AtomicUsize,
    reply: MockReply,
    gate: Option<Notify>,
}

impl MockGenerator {
    pub fn new(reply: MockReply) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reply,
            gate: None,
        }
    }

    /// A generator that holds every call until [`MockGenerator::release`].
    pub fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::new(MockReply::Audio)
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn pcm_payload(frames: usize) -> String {
    let bytes: Vec<u8> = (0..frames)
        .flat_map(|i| (((i % 64) as i16 - 32) * 512).to_le_bytes())
        .collect();
    STANDARD.encode(bytes)
}

#[async_trait]
impl SpeechGenerator for MockGenerator {
    async fn generate(
        &self,
        _api_key: &str,
        _request: &SpeechRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.reply {
            MockReply::Audio => Ok(GenerateContentResponse::from_parts(vec![Part::audio(
                pcm_payload(CLIP_FRAMES),
            )])),
            MockReply::TextOnly => Ok(GenerateContentResponse::from_parts(vec![Part::text(
                "no audio",
            )])),
            MockReply::Fail(detail) => Err(GenerationError::RemoteCall(detail.clone())),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub device: VirtualOutput,
    pub generator: Arc<MockGenerator>,
}

/// Create a test app instance backed by `generator` and a private output device
pub fn create_test_app_with(generator: MockGenerator, api_key: Option<&str>) -> TestApp {
    let generator = Arc::new(generator);
    let tts = TtsService::new(generator.clone(), api_key.map(str::to_string));
    let device = VirtualOutput::new(swar_audio::OUTPUT_SAMPLE_RATE);
    let state = AppState::new(tts, device.clone(), ServerConfig::default());
    TestApp {
        router: router(state.clone()),
        state,
        device,
        generator,
    }
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(MockGenerator::new(MockReply::Audio), Some("test-key"))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

impl TestApp {
    pub async fn send(&self, method: &str, uri: &str, body: Option<serde_json::Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_string(&value).unwrap())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.send("POST", uri, Some(body)).await
    }

    /// Generate one clip and return its history id.
    pub async fn generate(&self, text: &str) -> String {
        let response = self
            .post("/generate", serde_json::json!({ "text": text }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.json()["id"].as_str().unwrap().to_string()
    }
}
