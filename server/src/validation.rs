use std::str::FromStr;

use swar_speech::UnknownTag;
use uuid::Uuid;

use crate::error::ApiError;

/// Maximum text length for generation requests, in characters
const MAX_TEXT_LENGTH: usize = 5000;

/// Validate generation text and return it trimmed.
pub fn validate_generate_request(text: &str) -> Result<&str, ApiError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ApiError::InvalidInput("Text cannot be empty".to_string()));
    }
    if text.chars().count() > MAX_TEXT_LENGTH {
        return Err(ApiError::InvalidInput(format!(
            "Text too long (max {} characters)",
            MAX_TEXT_LENGTH
        )));
    }
    Ok(text)
}

/// Parse an optional tag, falling back to its default when absent.
pub fn parse_tag<T>(value: Option<&str>) -> Result<T, ApiError>
where
    T: FromStr<Err = UnknownTag> + Default,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.parse().map_err(|e: UnknownTag| ApiError::InvalidInput(e.to_string())),
        None => Ok(T::default()),
    }
}

/// Parse a history entry id from a path segment.
pub fn parse_entry_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::InvalidInput(format!("Invalid history id: {}", id)))
}

pub fn validate_volume(volume: f32) -> Result<f32, ApiError> {
    if !volume.is_finite() {
        return Err(ApiError::InvalidInput("Volume must be a number".to_string()));
    }
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swar_speech::{Emotion, Speed, VoiceId};

    #[test]
    fn test_validate_generate_request_trims() {
        assert_eq!(validate_generate_request("  नमस्ते \n").unwrap(), "नमस्ते");
    }

    #[test]
    fn test_validate_generate_request_empty_text() {
        for text in ["", "   ", "\n\t"] {
            let result = validate_generate_request(text);
            if let Err(ApiError::InvalidInput(msg)) = result {
                assert!(msg.contains("empty"));
            } else {
                panic!("expected InvalidInput for {text:?}");
            }
        }
    }

    #[test]
    fn test_validate_generate_request_too_long() {
        // counted in characters, not bytes
        let at_limit = "क".repeat(MAX_TEXT_LENGTH);
        assert!(validate_generate_request(&at_limit).is_ok());

        let long_text = "a".repeat(MAX_TEXT_LENGTH + 1);
        let result = validate_generate_request(&long_text);
        if let Err(ApiError::InvalidInput(msg)) = result {
            assert!(msg.contains("too long"));
        } else {
            panic!("expected InvalidInput");
        }
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag::<Emotion>(None).unwrap(), Emotion::Neutral);
        assert_eq!(parse_tag::<Emotion>(Some("")).unwrap(), Emotion::Neutral);
        assert_eq!(parse_tag::<Speed>(Some("slow")).unwrap(), Speed::Slow);
        assert_eq!(parse_tag::<VoiceId>(Some("Female1")).unwrap(), VoiceId::Female1);
        assert!(matches!(
            parse_tag::<Emotion>(Some("angry")),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_entry_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_entry_id(&id.to_string()).unwrap(), id);
        assert!(parse_entry_id("not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_volume() {
        assert_eq!(validate_volume(0.25).unwrap(), 0.25);
        assert!(validate_volume(f32::NAN).is_err());
        assert!(validate_volume(f32::INFINITY).is_err());
    }
}
