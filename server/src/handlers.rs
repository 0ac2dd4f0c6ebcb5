use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use swar_audio::{encode_wav, wav_file_name, AudioBuffer, Slot, WAV_CONTENT_TYPE};
use swar_speech::{
    Emotion, GenerationError, HistoryEntry, HistorySummary, Pitch, Speed, UnknownTag, VoiceId,
    VoiceProfile, VOICE_PROFILES,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics::{GenerationMetrics, MetricsResponse, PlaybackStats};
use crate::validation::{parse_entry_id, parse_tag, validate_generate_request, validate_volume};
use crate::{AppState, PreviewState};

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub text: String,
    pub voice_id: Option<String>,
    pub emotion: Option<String>,
    pub speed: Option<String>,
    pub pitch: Option<String>,
}

#[derive(Serialize)]
pub struct HistoryItem {
    #[serde(flatten)]
    pub summary: HistorySummary,
    pub is_playing: bool,
}

#[derive(Serialize)]
pub struct OptionsResponse {
    pub emotions: &'static [Emotion],
    pub speeds: &'static [Speed],
    pub pitches: &'static [Pitch],
    pub defaults: DefaultOptions,
}

#[derive(Serialize)]
pub struct DefaultOptions {
    pub voice_id: VoiceId,
    pub emotion: Emotion,
    pub speed: Speed,
    pub pitch: Pitch,
}

#[derive(Deserialize)]
pub struct PlayRequest {
    #[serde(default)]
    pub volume: Option<f32>,
}

#[derive(Deserialize)]
pub struct VolumeRequest {
    pub volume: f32,
}

#[derive(Serialize)]
pub struct PlaybackStatus {
    pub id: Uuid,
    pub playing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewOutcome {
    Playing,
    Stopped,
    /// A newer preview request or a stop arrived while this one was generating.
    Superseded,
}

#[derive(Serialize)]
pub struct PreviewResponse {
    pub voice_id: Option<VoiceId>,
    pub status: PreviewOutcome,
}

fn clip_slot(id: Uuid) -> Slot {
    Slot::Clip(id.to_string())
}

fn find_entry(state: &AppState, id: Uuid) -> Result<HistoryEntry, ApiError> {
    state
        .history()
        .get(id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("History entry {} not found", id)))
}

fn entry_audio(entry: HistoryEntry) -> Result<Arc<AudioBuffer>, ApiError> {
    entry
        .audio
        .ok_or_else(|| ApiError::Conflict("This entry has no audio".to_string()))
}

/// Run one generation under the configured timeout and record its outcome.
async fn timed_generate(
    state: &AppState,
    metrics: &GenerationMetrics,
    text: &str,
    profile: &VoiceProfile,
    emotion: Emotion,
    speed: Speed,
    pitch: Pitch,
) -> Result<AudioBuffer, GenerationError> {
    let started = Instant::now();
    let timeout = state.config.generation_timeout();
    let result = tokio::time::timeout(timeout, state.tts.generate(text, profile, emotion, speed, pitch))
        .await
        .unwrap_or_else(|_| {
            Err(GenerationError::RemoteCall(format!(
                "request timed out after {} seconds",
                timeout.as_secs()
            )))
        });

    match &result {
        Ok(_) => metrics.record_success(started.elapsed().as_millis() as u64),
        Err(e) => metrics.record_error(e.kind()),
    }
    result
}

pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_voices() -> Json<&'static [VoiceProfile]> {
    Json(&VOICE_PROFILES[..])
}

pub async fn list_options() -> Json<OptionsResponse> {
    Json(OptionsResponse {
        emotions: Emotion::ALL,
        speeds: Speed::ALL,
        pitches: Pitch::ALL,
        defaults: DefaultOptions {
            voice_id: VoiceId::default(),
            emotion: Emotion::default(),
            speed: Speed::default(),
            pitch: Pitch::default(),
        },
    })
}

pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<HistoryItem>), ApiError> {
    let text = validate_generate_request(&req.text)?;
    let voice_id: VoiceId = parse_tag(req.voice_id.as_deref())?;
    let emotion: Emotion = parse_tag(req.emotion.as_deref())?;
    let speed: Speed = parse_tag(req.speed.as_deref())?;
    let pitch: Pitch = parse_tag(req.pitch.as_deref())?;

    let profile = voice_id.profile();
    info!(
        voice = profile.name,
        %emotion,
        %speed,
        %pitch,
        chars = text.chars().count(),
        "generation requested"
    );

    let audio = timed_generate(
        &state,
        &state.metrics.generation,
        text,
        profile,
        emotion,
        speed,
        pitch,
    )
    .await?;

    let entry = HistoryEntry::new(text, voice_id, emotion, speed, pitch, audio);
    let item = HistoryItem {
        summary: entry.summary(),
        is_playing: false,
    };
    state.history().push(entry);

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn list_history(State(state): State<AppState>) -> Json<Vec<HistoryItem>> {
    let summaries: Vec<HistorySummary> = state
        .history()
        .entries()
        .iter()
        .map(HistoryEntry::summary)
        .collect();

    Json(
        summaries
            .into_iter()
            .map(|summary| HistoryItem {
                is_playing: state.playback.is_playing(&clip_slot(summary.id)),
                summary,
            })
            .collect(),
    )
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_entry_id(&id)?;
    find_entry(&state, id)?;

    state.playback.stop_slot(&clip_slot(id))?;
    state.history().remove(id);
    info!(%id, "history entry deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_entry_id(&id)?;
    let audio = entry_audio(find_entry(&state, id)?)?;

    let bytes = tokio::task::spawn_blocking(move || encode_wav(&audio))
        .await
        .map_err(|e| ApiError::Internal(format!("WAV encoding task failed: {e}")))?;

    let disposition = format!("attachment; filename=\"{}\"", wav_file_name(id));
    Ok((
        [
            (header::CONTENT_TYPE, WAV_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

pub async fn play_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<PlayRequest>>,
) -> Result<Json<PlaybackStatus>, ApiError> {
    let id = parse_entry_id(&id)?;
    let audio = entry_audio(find_entry(&state, id)?)?;
    // no body plays at full volume
    let requested = body.and_then(|Json(req)| req.volume).unwrap_or(1.0);
    let volume = validate_volume(requested)?.clamp(0.0, 1.0);

    state.playback.start(clip_slot(id), audio, Some(volume)).await?;

    Ok(Json(PlaybackStatus {
        id,
        playing: true,
        volume: Some(volume),
    }))
}

pub async fn stop_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackStatus>, ApiError> {
    let id = parse_entry_id(&id)?;
    find_entry(&state, id)?;

    state.playback.stop_slot(&clip_slot(id))?;

    Ok(Json(PlaybackStatus {
        id,
        playing: false,
        volume: None,
    }))
}

pub async fn set_entry_volume(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VolumeRequest>,
) -> Result<Json<PlaybackStatus>, ApiError> {
    let id = parse_entry_id(&id)?;
    find_entry(&state, id)?;
    let volume = validate_volume(req.volume)?.clamp(0.0, 1.0);

    let playing = state
        .playback
        .current(&clip_slot(id))
        .map(|handle| state.playback.set_volume(&handle, volume))
        .unwrap_or(false);

    Ok(Json(PlaybackStatus {
        id,
        playing,
        volume: Some(volume),
    }))
}

/// Cancel any pending preview and silence the preview slot. Returns the voice
/// that was still generating or sounding, if any.
fn halt_preview(state: &AppState) -> Result<Option<VoiceId>, ApiError> {
    state.previews.invalidate(&Slot::Preview);
    let previous = std::mem::take(&mut *state.preview());
    let sounding = state.playback.is_playing(&Slot::Preview);
    state.playback.stop_slot(&Slot::Preview)?;
    Ok(previous.voice.filter(|_| previous.pending || sounding))
}

pub async fn preview_voice(
    State(state): State<AppState>,
    Path(voice): Path<String>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let voice_id: VoiceId = voice
        .parse()
        .map_err(|e: UnknownTag| ApiError::NotFound(e.to_string()))?;

    let playing = state.playback.is_playing(&Slot::Preview);
    let toggled_off = {
        let preview = state.preview();
        preview.voice == Some(voice_id) && (preview.pending || playing)
    };
    if toggled_off {
        halt_preview(&state)?;
        return Ok(Json(PreviewResponse {
            voice_id: Some(voice_id),
            status: PreviewOutcome::Stopped,
        }));
    }

    halt_preview(&state)?;
    let ticket = state.previews.begin(Slot::Preview);
    *state.preview() = PreviewState {
        voice: Some(voice_id),
        pending: true,
    };

    let profile = voice_id.profile();
    let result = timed_generate(
        &state,
        &state.metrics.preview,
        profile.preview_text,
        profile,
        Emotion::Neutral,
        Speed::Medium,
        Pitch::Medium,
    )
    .await;

    let superseded = Json(PreviewResponse {
        voice_id: Some(voice_id),
        status: PreviewOutcome::Superseded,
    });
    if !state.previews.is_current(&ticket) {
        state.metrics.preview.record_discarded();
        debug!(voice = profile.name, "discarding superseded preview");
        return Ok(superseded);
    }

    let audio = match result {
        Ok(audio) => audio,
        Err(e) => {
            *state.preview() = PreviewState::default();
            return Err(e.into());
        }
    };
    state.preview().pending = false;

    let handle = state.playback.start(Slot::Preview, Arc::new(audio), None).await?;
    // a stop may have landed while the flow was opening
    if !state.previews.is_current(&ticket) {
        state.playback.stop(&handle)?;
        state.metrics.preview.record_discarded();
        return Ok(superseded);
    }

    Ok(Json(PreviewResponse {
        voice_id: Some(voice_id),
        status: PreviewOutcome::Playing,
    }))
}

pub async fn stop_preview(State(state): State<AppState>) -> Result<Json<PreviewResponse>, ApiError> {
    let voice_id = halt_preview(&state)?;
    Ok(Json(PreviewResponse {
        voice_id,
        status: PreviewOutcome::Stopped,
    }))
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> Json<MetricsResponse> {
    let device = state.playback.device();
    let history_entries = state.history().len();

    Json(MetricsResponse {
        timestamp: Utc::now(),
        request_count: state
            .metrics
            .request_count
            .load(std::sync::atomic::Ordering::Relaxed),
        uptime_seconds: state.metrics.uptime_seconds(),
        generation: state.metrics.generation.stats(),
        preview: state.metrics.preview.stats(),
        playback: PlaybackStats {
            active_slots: state.playback.active_count(),
            open_flows: device.open_flows(),
            released_flows: device.released_flows(),
        },
        history_entries,
    })
}
