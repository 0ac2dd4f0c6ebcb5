mod error;
mod gemini;
mod history;
mod prompt;
mod sequencer;
mod service;
mod voices;

pub use error::{ErrorKind, GenerationError};
pub use gemini::{
    Candidate, Content, GeminiClient, GeminiConfig, GenerateContentResponse, InlineData, Part,
    SpeechGenerator, SpeechRequest, DEFAULT_BASE_URL, DEFAULT_MODEL,
};
pub use history::{History, HistoryEntry, HistorySummary};
pub use prompt::{emotion_cue, pacing, pitch_descriptor, speech_prompt, style_directive};
pub use sequencer::{RequestSequencer, Ticket};
pub use service::{TtsService, GENERATED_CHANNELS, GENERATED_SAMPLE_RATE};
pub use voices::{
    BaseVoice, Emotion, Gender, Pitch, Speed, UnknownTag, VoiceId, VoiceProfile, VOICE_PROFILES,
};
