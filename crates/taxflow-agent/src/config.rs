use serde::{Deserialize, Serialize};

/// Which generation backend answers agent prompts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationBackend {
    /// Canned local responses after a configurable delay.
    #[default]
    Mock,
    /// Any OpenAI-compatible chat completions endpoint.
    OpenAi,
}

/// Model and backend settings shared by every agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Backend selection.
    #[serde(default)]
    pub provider: GenerationBackend,
    /// Model identifier sent to the backend.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// API key; required by the OpenAI backend only.
    #[serde(default)]
    pub api_key: String,
    /// Overrides the backend's default base URL.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completion token cap.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Simulated latency of the mock backend.
    #[serde(default = "default_mock_latency_ms")]
    pub mock_latency_ms: u64,
}

fn default_model_id() -> String {
    "gpt-4".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_mock_latency_ms() -> u64 {
    100
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: GenerationBackend::default(),
            model_id: default_model_id(),
            api_key: String::new(),
            api_base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            mock_latency_ms: default_mock_latency_ms(),
        }
    }
}

impl ModelConfig {
    /// Mock backend with no artificial delay.
    pub fn instant_mock() -> Self {
        Self {
            mock_latency_ms: 0,
            ..Self::default()
        }
    }

    /// Base URL of the chat completions API, without the `/v1/...` path.
    pub fn base_url(&self) -> &str {
        match &self.api_base_url {
            Some(url) => url.trim_end_matches('/'),
            None => "https://api.openai.com",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ModelConfig::default();
        assert_eq!(config.provider, GenerationBackend::Mock);
        assert_eq!(config.model_id, "gpt-4");
        assert_eq!(config.mock_latency_ms, 100);
        assert_eq!(ModelConfig::instant_mock().mock_latency_ms, 0);
    }

    #[test]
    fn test_provider_serialization() {
        assert_eq!(
            serde_json::to_string(&GenerationBackend::OpenAi).unwrap(),
            "\"openai\""
        );
        let parsed: GenerationBackend = serde_json::from_str("\"mock\"").unwrap();
        assert_eq!(parsed, GenerationBackend::Mock);
    }

    #[test]
    fn test_base_url() {
        let mut config = ModelConfig::default();
        assert_eq!(config.base_url(), "https://api.openai.com");
        config.api_base_url = Some("http://localhost:11434/".into());
        assert_eq!(config.base_url(), "http://localhost:11434");
    }
}
