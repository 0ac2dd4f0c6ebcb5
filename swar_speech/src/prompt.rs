//! Style directive sent alongside the text.

use crate::voices::{Emotion, Pitch, Speed, VoiceProfile};

pub fn emotion_cue(emotion: Emotion) -> &'static str {
    match emotion {
        Emotion::Neutral => "neutral and balanced",
        Emotion::Happy => "joyful and upbeat with a clear smile",
        Emotion::Sad => "deeply melancholic, slow, and somber",
        Emotion::Excited => "high energy, enthusiastic, and fast-paced",
        Emotion::Calm => "whisper-soft, serene, and peaceful",
    }
}

pub fn pacing(speed: Speed) -> &'static str {
    match speed {
        Speed::Slow => "slow",
        Speed::Medium => "standard",
        Speed::Fast => "rapid",
    }
}

pub fn pitch_descriptor(pitch: Pitch) -> &'static str {
    match pitch {
        Pitch::Low => "deep",
        Pitch::Medium => "natural",
        Pitch::High => "bright",
    }
}

/// System instruction constraining the model to pure Hindi in the
/// profile's character with the requested delivery.
pub fn style_directive(profile: &VoiceProfile, emotion: Emotion, speed: Speed, pitch: Pitch) -> String {
    format!(
        "You are a professional Hindi Voice Artist.\n\
         Strict Rules:\n\
         1. ONLY Pure Indian Hindi. No English words (e.g., use 'सूचना' not 'information').\n\
         2. Neutral, high-quality Indian accent. No regional dialect or English-mixed accent.\n\
         3. Voice Character: {}.\n\
         4. Target Emotion: {}.\n\
         5. Pacing: {}.\n\
         6. Pitch: {}.",
        profile.prompt_instructions,
        emotion_cue(emotion),
        pacing(speed),
        pitch_descriptor(pitch),
    )
}

/// The user turn wrapping the text to speak.
pub fn speech_prompt(text: &str) -> String {
    format!("Generate pure Hindi audio for: {text}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voices::VoiceId;

    #[test]
    fn directive_lists_every_rule() {
        let profile = VoiceId::Female1.profile();
        let directive = style_directive(profile, Emotion::Sad, Speed::Slow, Pitch::High);

        let lines: Vec<&str> = directive.lines().collect();
        assert_eq!(lines[0], "You are a professional Hindi Voice Artist.");
        assert_eq!(lines[1], "Strict Rules:");
        assert!(lines[2].starts_with("1. ONLY Pure Indian Hindi."));
        assert!(lines[3].starts_with("2. Neutral, high-quality Indian accent."));
        assert_eq!(lines[4], format!("3. Voice Character: {}.", profile.prompt_instructions));
        assert_eq!(lines[5], "4. Target Emotion: deeply melancholic, slow, and somber.");
        assert_eq!(lines[6], "5. Pacing: slow.");
        assert_eq!(lines[7], "6. Pitch: bright.");
    }

    #[test]
    fn descriptor_tables() {
        assert_eq!(pacing(Speed::Medium), "standard");
        assert_eq!(pacing(Speed::Fast), "rapid");
        assert_eq!(pitch_descriptor(Pitch::Low), "deep");
        assert_eq!(pitch_descriptor(Pitch::Medium), "natural");
        assert_eq!(emotion_cue(Emotion::Neutral), "neutral and balanced");
        assert_eq!(emotion_cue(Emotion::Calm), "whisper-soft, serene, and peaceful");
    }

    #[test]
    fn prompt_wraps_text() {
        assert_eq!(speech_prompt("नमस्ते"), "Generate pure Hindi audio for: नमस्ते");
    }
}
