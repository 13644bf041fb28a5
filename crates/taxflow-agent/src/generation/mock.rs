use super::GenerationProvider;
use crate::config::ModelConfig;
use async_trait::async_trait;
use std::time::Duration;
use taxflow_core::TaxflowResult;
use tracing::debug;

/// Offline backend returning a canned acknowledgement after a fixed delay.
pub struct MockGeneration {
    model_id: String,
    latency: Duration,
}

impl MockGeneration {
    /// Mock backend using `config.model_id` and `config.mock_latency_ms`.
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            model_id: config.model_id.clone(),
            latency: Duration::from_millis(config.mock_latency_ms),
        }
    }
}

#[async_trait]
impl GenerationProvider for MockGeneration {
    async fn generate(&self, prompt: &str) -> TaxflowResult<String> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let chars = prompt.chars().count();
        debug!(model = %self.model_id, prompt_chars = chars, "Mock generation");
        Ok(format!(
            "[Response from {}]: Processed request successfully ({chars} prompt chars)",
            self.model_id
        ))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_response_format() {
        let backend = MockGeneration::new(&ModelConfig::instant_mock());
        let out = backend.generate("Prepare 1040").await.unwrap();
        assert_eq!(
            out,
            "[Response from gpt-4]: Processed request successfully (12 prompt chars)"
        );
    }

    #[tokio::test]
    async fn test_mock_latency() {
        let config = ModelConfig {
            mock_latency_ms: 30,
            ..ModelConfig::default()
        };
        let backend = MockGeneration::new(&config);
        let start = std::time::Instant::now();
        backend.generate("x").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
