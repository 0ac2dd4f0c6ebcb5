use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prebuilt voices offered by the speech model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseVoice {
    Charon,
    Puck,
    Fenrir,
    Kore,
    Zephyr,
}

impl BaseVoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseVoice::Charon => "Charon",
            BaseVoice::Puck => "Puck",
            BaseVoice::Fenrir => "Fenrir",
            BaseVoice::Kore => "Kore",
            BaseVoice::Zephyr => "Zephyr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

/// A studio voice: a base voice plus the character instructions that shape it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceProfile {
    pub id: VoiceId,
    pub name: &'static str,
    pub gender: Gender,
    pub tagline: &'static str,
    pub description: &'static str,
    pub base_voice: BaseVoice,
    pub prompt_instructions: &'static str,
    pub preview_text: &'static str,
}

pub static VOICE_PROFILES: [VoiceProfile; 6] = [
    VoiceProfile {
        id: VoiceId::Male1,
        name: "Vikram",
        gender: Gender::Male,
        tagline: "Deep & Authoritative",
        description: "A deep, rich, bass-heavy voice. Mature and commanding. Best for audiobooks and documentaries.",
        base_voice: BaseVoice::Charon,
        prompt_instructions: "Deep, rich, bass-heavy male voice. Mature, confident, and commanding presence. Like a veteran narrator.",
        preview_text: "नमस्ते, मैं विक्रम हूँ। मेरी आवाज़ गहरी और प्रभावशाली है।",
    },
    VoiceProfile {
        id: VoiceId::Male2,
        name: "Arjun",
        gender: Gender::Male,
        tagline: "Smooth & Friendly",
        description: "Warm, pleasant, and approachable. Ideal for storytelling, YouTube, and educational content.",
        base_voice: BaseVoice::Puck,
        prompt_instructions: "Smooth, warm, friendly male voice. Calm and approachable personality. Natural storytelling balance.",
        preview_text: "नमस्ते, मैं अर्जुन हूँ। मैं कहानियाँ सुनाना पसंद करता हूँ।",
    },
    VoiceProfile {
        id: VoiceId::Male3,
        name: "Ishaan",
        gender: Gender::Male,
        tagline: "Powerful & Energetic",
        description: "Strong, energetic, and bold. Perfect for advertisements, promos, and reels.",
        base_voice: BaseVoice::Fenrir,
        prompt_instructions: "Strong, energetic male voice. Bold, clear, and impactful without being harsh. High clarity and energy.",
        preview_text: "नमस्कार! मैं ईशान हूँ। मेरी आवाज़ में बहुत जोश और शक्ति है।",
    },
    VoiceProfile {
        id: VoiceId::Female1,
        name: "Ananya",
        gender: Gender::Female,
        tagline: "Sweet & Calm",
        description: "Soothing, gentle, and warm tone. Best for meditation, kids content, and soft storytelling.",
        base_voice: BaseVoice::Kore,
        prompt_instructions: "Sweet, soothing female voice. Soft, warm, and emotionally gentle tone. Natural feminine softness.",
        preview_text: "नमस्ते, मैं अनन्या हूँ। मेरी आवाज़ बहुत शांत और मीठी है।",
    },
    VoiceProfile {
        id: VoiceId::Female2,
        name: "Meera",
        gender: Gender::Female,
        tagline: "Professional & Confident",
        description: "Clear, authoritative newsroom-style. Perfect for news, corporate explainers, and education.",
        base_voice: BaseVoice::Zephyr,
        prompt_instructions: "Confident, professional female voice. Clear, strong newsroom-style delivery with balanced articulation.",
        preview_text: "नमस्कार, मैं मीरा हूँ। मैं पेशेवर और स्पष्ट जानकारी देने में सक्षम हूँ।",
    },
    VoiceProfile {
        id: VoiceId::Female3,
        name: "Sia",
        gender: Gender::Female,
        tagline: "Emotional & Expressive",
        description: "Highly dynamic and expressive. Capable of intense emotional variation for drama and films.",
        base_voice: BaseVoice::Zephyr,
        prompt_instructions: "Highly expressive and emotional female voice. Capable of conveying extreme happiness or deep sadness naturally.",
        preview_text: "नमस्ते, मैं सिया हूँ। मैं भावनाओं को बहुत गहराई से व्यक्त करती हूँ।",
    },
];

/// Error for tag names that are not part of a fixed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownTag {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! tag_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal, default = $default:ident, [$($variant:ident),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownTag;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|tag| tag.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| UnknownTag { kind: $kind, value: s.to_string() })
            }
        }
    };
}

tag_enum!(
    /// One of the six studio voices.
    VoiceId, "voice", default = Male2, [Male1, Male2, Male3, Female1, Female2, Female3]
);
tag_enum!(
    /// Target emotion of the delivery.
    Emotion, "emotion", default = Neutral, [Neutral, Happy, Sad, Excited, Calm]
);
tag_enum!(Speed, "speed", default = Medium, [Slow, Medium, Fast]);
tag_enum!(Pitch, "pitch", default = Medium, [Low, Medium, High]);

impl VoiceId {
    /// Catalog entry for this voice.
    pub fn profile(&self) -> &'static VoiceProfile {
        let index = match self {
            VoiceId::Male1 => 0,
            VoiceId::Male2 => 1,
            VoiceId::Male3 => 2,
            VoiceId::Female1 => 3,
            VoiceId::Female2 => 4,
            VoiceId::Female3 => 5,
        };
        &VOICE_PROFILES[index]
    }
}
