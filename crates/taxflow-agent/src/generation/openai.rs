use super::GenerationProvider;
use crate::config::ModelConfig;
use async_trait::async_trait;
use taxflow_core::{TaxflowError, TaxflowResult};
use tracing::debug;

/// OpenAI-compatible chat completions backend.
///
/// Works with OpenAI, Groq, Ollama, and any other provider that implements
/// the OpenAI chat completions API.
pub struct OpenAiGeneration {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiGeneration {
    /// Backend for `config`; requests go to `{base_url}/v1/chat/completions`.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl GenerationProvider for OpenAiGeneration {
    async fn generate(&self, prompt: &str) -> TaxflowResult<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());

        let body = serde_json::json!({
            "model": self.config.model_id,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| TaxflowError::Http(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| TaxflowError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(TaxflowError::Http(format!(
                "OpenAI API error {status}: {text}"
            )));
        }

        let resp_body: serde_json::Value = serde_json::from_str(&text)?;
        debug!(model = %self.config.model_id, "Chat completion received");
        parse_completion(&resp_body)
    }

    fn model_id(&self) -> &str {
        &self.config.model_id
    }
}

/// Extracts `choices[0].message.content` from a chat completion body.
pub fn parse_completion(body: &serde_json::Value) -> TaxflowResult<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| TaxflowError::Generation("response has no message content".to_string()))
}
