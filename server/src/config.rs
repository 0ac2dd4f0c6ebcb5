// Configuration for the studio server

use std::time::Duration;

use swar_speech::{GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub rate_limit_per_minute: u32,
    pub generation_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8085,
            rate_limit_per_minute: 60,
            generation_timeout_secs: 120,
            request_timeout_secs: 150,
            cors_allowed_origins: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            });

        Self {
            port: parsed("PORT").unwrap_or(defaults.port),
            rate_limit_per_minute: parsed("RATE_LIMIT_PER_MINUTE")
                .unwrap_or(defaults.rate_limit_per_minute),
            generation_timeout_secs: parsed("GENERATION_TIMEOUT_SECS")
                .unwrap_or(defaults.generation_timeout_secs),
            request_timeout_secs: parsed("REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            cors_allowed_origins,
            gemini_model: non_empty("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: non_empty("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            api_key: non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY")),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            base_url: self.gemini_base_url.clone(),
            model: self.gemini_model.clone(),
            timeout: self.generation_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8085);
        assert_eq!(config.rate_limit_per_minute, 60);
        assert_eq!(config.generation_timeout(), Duration::from_secs(120));
        assert_eq!(config.request_timeout(), Duration::from_secs(150));
        assert!(config.api_key.is_none());

        let gemini = config.gemini();
        assert_eq!(gemini.model, "gemini-2.5-flash-preview-tts");
        assert_eq!(gemini.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(gemini.timeout, Duration::from_secs(120));
    }
}
