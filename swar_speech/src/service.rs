use std::sync::Arc;
use std::time::Instant;

use swar_audio::{decode_base64_pcm, AudioBuffer};
use tracing::{error, info};

use crate::error::GenerationError;
use crate::gemini::{SpeechGenerator, SpeechRequest};
use crate::prompt::{speech_prompt, style_directive};
use crate::voices::{Emotion, Pitch, Speed, VoiceProfile};

/// Rate of the PCM returned by the speech model.
pub const GENERATED_SAMPLE_RATE: u32 = 24_000;
pub const GENERATED_CHANNELS: usize = 1;

/// Turns text plus delivery tags into decoded audio.
#[derive(Clone)]
pub struct TtsService {
    generator: Arc<dyn SpeechGenerator>,
    api_key: Option<String>,
}

impl TtsService {
    pub fn new(generator: Arc<dyn SpeechGenerator>, api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|key| !key.trim().is_empty());
        Self { generator, api_key }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn generate(
        &self,
        text: &str,
        profile: &VoiceProfile,
        emotion: Emotion,
        speed: Speed,
        pitch: Pitch,
    ) -> Result<AudioBuffer, GenerationError> {
        let started = Instant::now();
        let result = self.run(text, profile, emotion, speed, pitch).await;

        match &result {
            Ok(buffer) => info!(
                voice = profile.name,
                %emotion,
                %speed,
                %pitch,
                frames = buffer.frame_count(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "speech generated"
            ),
            Err(e) => error!(
                voice = profile.name,
                kind = e.kind().as_str(),
                error = %e,
                "speech generation failed"
            ),
        }
        result
    }

    async fn run(
        &self,
        text: &str,
        profile: &VoiceProfile,
        emotion: Emotion,
        speed: Speed,
        pitch: Pitch,
    ) -> Result<AudioBuffer, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::Configuration)?;

        let request = SpeechRequest {
            prompt: speech_prompt(text),
            style: style_directive(profile, emotion, speed, pitch),
            voice: profile.base_voice,
        };
        let response = self.generator.generate(api_key, &request).await?;

        let payload = response.first_audio().ok_or(GenerationError::NoAudio)?;
        Ok(decode_base64_pcm(payload, GENERATED_SAMPLE_RATE, GENERATED_CHANNELS)?)
    }
}
