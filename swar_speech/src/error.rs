use swar_audio::DecodeError;
use thiserror::Error;

/// Coarse category of a failed generation, kept for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    RemoteCall,
    NoAudio,
    Decode,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::RemoteCall => "remote_call",
            ErrorKind::NoAudio => "no_audio",
            ErrorKind::Decode => "decode",
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no API key configured for the speech service")]
    Configuration,

    #[error("speech service call failed: {0}")]
    RemoteCall(String),

    #[error("speech service response carried no audio")]
    NoAudio,

    #[error("could not decode generated audio: {0}")]
    Decode(#[from] DecodeError),
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::Configuration => ErrorKind::Configuration,
            GenerationError::RemoteCall(_) => ErrorKind::RemoteCall,
            GenerationError::NoAudio => ErrorKind::NoAudio,
            GenerationError::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Text shown to the studio user.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Configuration => "API कुंजी (API Key) नहीं मिली।".to_string(),
            GenerationError::RemoteCall(detail) => {
                format!("हिंदी आवाज़ बनाने में त्रुटि हुई। ({detail})")
            }
            GenerationError::NoAudio => "मॉडल से कोई ऑडियो प्राप्त नहीं हुआ।".to_string(),
            GenerationError::Decode(_) => "ऑडियो डेटा डिकोडिंग में विफल रहा।".to_string(),
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        GenerationError::RemoteCall(e.to_string())
    }
}
