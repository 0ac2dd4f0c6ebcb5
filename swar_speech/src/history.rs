//! Generated clips kept for replay and download, newest first.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use swar_audio::AudioBuffer;
use uuid::Uuid;

use crate::voices::{Emotion, Pitch, Speed, VoiceId};

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub text: String,
    pub voice_id: VoiceId,
    pub emotion: Emotion,
    pub speed: Speed,
    pub pitch: Pitch,
    pub created_at: DateTime<Utc>,
    pub audio: Option<Arc<AudioBuffer>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistorySummary {
    pub id: Uuid,
    pub text: String,
    pub voice_id: VoiceId,
    pub voice_name: &'static str,
    pub emotion: Emotion,
    pub speed: Speed,
    pub pitch: Pitch,
    pub created_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub sample_rate: u32,
    pub channels: usize,
    pub has_audio: bool,
}

impl HistoryEntry {
    pub fn new(
        text: impl Into<String>,
        voice_id: VoiceId,
        emotion: Emotion,
        speed: Speed,
        pitch: Pitch,
        audio: AudioBuffer,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            voice_id,
            emotion,
            speed,
            pitch,
            created_at: Utc::now(),
            audio: Some(Arc::new(audio)),
        }
    }

    pub fn summary(&self) -> HistorySummary {
        let info = self.audio.as_ref().map(|audio| audio.info());
        HistorySummary {
            id: self.id,
            text: self.text.clone(),
            voice_id: self.voice_id,
            voice_name: self.voice_id.profile().name,
            emotion: self.emotion,
            speed: self.speed,
            pitch: self.pitch,
            created_at: self.created_at,
            duration_ms: info.as_ref().map_or(0, |i| i.duration_ms),
            sample_rate: info.as_ref().map_or(0, |i| i.sample_rate),
            channels: info.as_ref().map_or(0, |i| i.channels),
            has_audio: info.is_some(),
        }
    }
}

#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
    }

    pub fn remove(&mut self, id: Uuid) -> Option<HistoryEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn get(&self, id: Uuid) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
